use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::Car;

/// Axis-aligned box in the driving plane.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub center: [f32; 2],
    pub half_extents: [f32; 2],
}

impl Aabb {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center: center.to_array(),
            half_extents: half_extents.to_array(),
        }
    }

    pub fn min(&self) -> Vec2 {
        Vec2::from(self.center) - Vec2::from(self.half_extents)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::from(self.center) + Vec2::from(self.half_extents)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::from(self.half_extents) * 2.0
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// Strict overlap: boxes that only touch along an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
    }

    /// `other` lies entirely within this box.
    pub fn encloses(&self, other: &Aabb) -> bool {
        self.contains_point(other.min()) && self.contains_point(other.max())
    }
}

/// Static region the car has to stay in.
#[derive(Clone, Debug, PartialEq)]
pub enum Track {
    /// Annulus around `center`; both radii are inclusive.
    Ring {
        center: Vec2,
        inner_radius: f32,
        outer_radius: f32,
    },
    /// Rectangular plane fenced by four wall segments.
    Walled { interior: Aabb, walls: [Aabb; 4] },
}

impl Track {
    /// Build a walled plane whose drivable interior spans `half_extents`
    /// around `center`, fenced by walls `thickness` deep.
    pub fn walled(center: Vec2, half_extents: Vec2, thickness: f32) -> Self {
        let half_t = thickness * 0.5;
        let outer = half_extents + Vec2::splat(thickness);
        let walls = [
            // north, south
            Aabb::new(
                center + Vec2::new(0.0, half_extents.y + half_t),
                Vec2::new(outer.x, half_t),
            ),
            Aabb::new(
                center - Vec2::new(0.0, half_extents.y + half_t),
                Vec2::new(outer.x, half_t),
            ),
            // east, west
            Aabb::new(
                center + Vec2::new(half_extents.x + half_t, 0.0),
                Vec2::new(half_t, outer.y),
            ),
            Aabb::new(
                center - Vec2::new(half_extents.x + half_t, 0.0),
                Vec2::new(half_t, outer.y),
            ),
        ];

        Track::Walled {
            interior: Aabb::new(center, half_extents),
            walls,
        }
    }

    /// Ring tracks test the position as a point; walled tracks test a box
    /// of `footprint` half extents centred on it.
    pub fn is_inside_track(&self, position: Vec2, footprint: Vec2) -> bool {
        match self {
            Track::Ring {
                center,
                inner_radius,
                outer_radius,
            } => {
                let distance = position.distance(*center);
                distance >= *inner_radius && distance <= *outer_radius
            }
            Track::Walled { interior, walls } => {
                let body = Aabb::new(position, footprint);
                interior.encloses(&body) && !walls.iter().any(|wall| wall.overlaps(&body))
            }
        }
    }

    /// Largest distance from the track centre to any drivable point.
    pub fn extent(&self) -> f32 {
        match self {
            Track::Ring { outer_radius, .. } => *outer_radius,
            Track::Walled { walls, .. } => walls
                .iter()
                .flat_map(|wall| [wall.max().abs(), wall.min().abs()])
                .fold(0.0_f32, |acc, corner| acc.max(corner.max_element())),
        }
    }

    pub fn center(&self) -> Vec2 {
        match self {
            Track::Ring { center, .. } => *center,
            Track::Walled { interior, .. } => Vec2::from(interior.center),
        }
    }
}

/// Hard reset: a car that left the track goes back to `origin`, stopped
/// and facing heading 0. Cars still on track pass through unchanged.
pub fn correct_on_violation(car: Car, track: &Track, footprint: Vec2, origin: Vec2) -> (Car, bool) {
    if track.is_inside_track(car.position, footprint) {
        (car, false)
    } else {
        (Car::parked_at(origin), true)
    }
}
