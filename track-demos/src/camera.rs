use bevy::math::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::Car;

/// Chase camera mounted at a fixed offset in the car's local frame.
///
/// Local frame: +Z is the car's forward direction, +Y is up.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    pub offset: [f32; 3],
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            offset: [0.0, 5.0, -10.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
}

impl CameraPose {
    /// Eye position projected onto the driving plane.
    pub fn plane_eye(&self) -> Vec2 {
        Vec2::new(self.eye.x, self.eye.z)
    }
}

impl CameraRig {
    /// Camera at car position plus the offset rotated by the car's heading,
    /// looking at the car.
    pub fn follow(&self, car: &Car) -> CameraPose {
        let target = Vec3::new(car.position.x, 0.0, car.position.y);
        let eye = target + Quat::from_rotation_y(car.heading) * Vec3::from(self.offset);
        CameraPose { eye, target }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use bevy::math::{Vec2, Vec3};

    use super::CameraRig;
    use crate::Car;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn camera_trails_the_car_at_heading_zero() {
        let car = Car::parked_at(Vec2::new(3.0, -20.0));
        let pose = CameraRig::default().follow(&car);
        assert!(close(pose.target, Vec3::new(3.0, 0.0, -20.0)));
        assert!(close(pose.eye, Vec3::new(3.0, 5.0, -30.0)));
        assert_eq!(pose.plane_eye(), Vec2::new(pose.eye.x, pose.eye.z));
    }

    #[test]
    fn camera_swings_with_the_heading() {
        let rig = CameraRig::default();
        let mut car = Car::parked_at(Vec2::ZERO);

        car.heading = FRAC_PI_2;
        assert!(close(rig.follow(&car).eye, Vec3::new(-10.0, 5.0, 0.0)));

        car.heading = PI;
        assert!(close(rig.follow(&car).eye, Vec3::new(0.0, 5.0, 10.0)));
    }

    #[test]
    fn eye_stays_behind_the_forward_direction() {
        let rig = CameraRig::default();
        for step in 0..16 {
            let mut car = Car::parked_at(Vec2::new(1.0, 2.0));
            car.heading = step as f32 * 0.4;
            let pose = rig.follow(&car);
            let behind = car.position - pose.plane_eye();
            assert!(behind.dot(car.forward()) > 9.9);
        }
    }
}
