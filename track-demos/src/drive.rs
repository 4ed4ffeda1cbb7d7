use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::Car;
use crate::input::Controls;

/// How held controls move the car during one tick.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum DriveModel {
    /// Arrow-key translation: each held key moves the car `step` along an axis.
    /// Heading is ignored. Forward is -Y, reverse +Y, left -X, right +X.
    Axis { step: f32 },
    /// Heading-based driving with a scalar speed and multiplicative friction.
    Heading {
        acceleration: f32,
        max_forward: f32,
        max_reverse: f32,
        /// Per-tick speed multiplier, strictly between 0 and 1.
        friction: f32,
        turn_rate: f32,
    },
}

impl DriveModel {
    /// Advance `car` by one tick: controls, friction, then integration.
    pub fn drive(&self, car: &Car, controls: Controls) -> Car {
        match *self {
            DriveModel::Axis { step } => drive_axis(car, controls, step),
            DriveModel::Heading {
                acceleration,
                max_forward,
                max_reverse,
                friction,
                turn_rate,
            } => {
                let mut next = *car;
                if controls.forward {
                    next.speed += acceleration;
                }
                if controls.reverse {
                    next.speed -= acceleration;
                }
                next.speed = next.speed.clamp(-max_reverse, max_forward);

                if controls.left {
                    next.heading += turn_rate;
                }
                if controls.right {
                    next.heading -= turn_rate;
                }

                next.speed *= friction;
                next.position += next.forward() * next.speed;
                next
            }
        }
    }
}

#[cfg(test)]
impl DriveModel {
    /// Fastest forward speed the model can produce.
    pub(crate) fn max_forward(&self) -> f32 {
        match *self {
            DriveModel::Axis { step } => step,
            DriveModel::Heading { max_forward, .. } => max_forward,
        }
    }

    /// Most negative speed the model can produce (as a positive magnitude).
    pub(crate) fn max_reverse(&self) -> f32 {
        match *self {
            DriveModel::Axis { .. } => 0.0,
            DriveModel::Heading { max_reverse, .. } => max_reverse,
        }
    }
}

fn drive_axis(car: &Car, controls: Controls, step: f32) -> Car {
    let speed = if controls.any() { step } else { 0.0 };

    let mut delta = Vec2::ZERO;
    if controls.forward {
        delta.y -= speed;
    }
    if controls.reverse {
        delta.y += speed;
    }
    if controls.left {
        delta.x -= speed;
    }
    if controls.right {
        delta.x += speed;
    }

    Car {
        position: car.position + delta,
        heading: car.heading,
        speed,
    }
}
