use bevy::math::Vec2;

pub mod camera;
pub mod config;
pub mod drive;
pub mod input;
pub mod lap;
pub mod session;
pub mod track;

/// Kinematic state of the player's car.
///
/// `position` is planar: x/y for the canvas demo, x/z for the scene demos.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Car {
    pub position: Vec2,
    pub heading: f32,
    pub speed: f32,
}

impl Car {
    /// A stationary car at `origin` with heading 0.
    pub fn parked_at(origin: Vec2) -> Self {
        Self {
            position: origin,
            heading: 0.0,
            speed: 0.0,
        }
    }

    /// Unit vector the car drives along (heading 0 points along +Y).
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.heading.sin(), self.heading.cos())
    }
}
