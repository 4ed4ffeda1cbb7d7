use std::path::Path;

use bevy::math::Vec2;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::camera::CameraRig;
use crate::drive::DriveModel;
use crate::input::{Bindings, KeyCase};
use crate::lap::LapRules;
use crate::session::RaceSetup;
use crate::track::{Aabb, Track};

#[derive(
    Serialize, Deserialize, ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Arrow keys nudge a box around a spinning ring.
    Orbit,
    /// Arrow keys on a flat canvas ring.
    Canvas,
    /// Steered car on a walled plane with laps and a chase camera.
    #[default]
    Circuit,
}

impl Variant {
    pub fn title(&self) -> &'static str {
        match self {
            Variant::Orbit => "Orbit",
            Variant::Canvas => "Canvas Ring",
            Variant::Circuit => "Circuit",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackShape {
    Ring {
        center: [f32; 2],
        inner_radius: f32,
        outer_radius: f32,
    },
    Walled {
        center: [f32; 2],
        half_extents: [f32; 2],
        wall_thickness: f32,
    },
}

impl TrackShape {
    fn build(&self) -> Result<Track, String> {
        match *self {
            TrackShape::Ring {
                center,
                inner_radius,
                outer_radius,
            } => {
                if !(inner_radius >= 0.0 && inner_radius < outer_radius) {
                    return Err(format!(
                        "ring radii must satisfy 0 <= inner < outer (got {inner_radius}, {outer_radius})"
                    ));
                }
                Ok(Track::Ring {
                    center: Vec2::from(center),
                    inner_radius,
                    outer_radius,
                })
            }
            TrackShape::Walled {
                center,
                half_extents,
                wall_thickness,
            } => {
                let half_extents = Vec2::from(half_extents);
                if half_extents.min_element() <= 0.0 || wall_thickness <= 0.0 {
                    return Err(format!(
                        "walled track needs positive extents and wall thickness (got {half_extents:?}, {wall_thickness})"
                    ));
                }
                Ok(Track::walled(Vec2::from(center), half_extents, wall_thickness))
            }
        }
    }
}

/// Everything one demo needs: simulation parameters plus a few render hints.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VariantParams {
    pub origin: [f32; 2],
    /// Full width and length of the car body.
    pub car_size: [f32; 2],
    pub drive: DriveModel,
    pub track: TrackShape,
    pub bindings: Bindings,
    #[serde(default)]
    pub key_case: KeyCase,
    #[serde(default)]
    pub laps: Option<LapRules>,
    #[serde(default)]
    pub camera: Option<CameraRig>,
    /// World units per screen pixel.
    #[serde(default = "default_view_scale")]
    pub view_scale: f32,
    /// Visual track rotation in radians per frame.
    #[serde(default)]
    pub track_spin: f32,
}

fn default_view_scale() -> f32 {
    0.05
}

fn default_tick_hz() -> f64 {
    60.0
}

impl VariantParams {
    pub fn orbit() -> Self {
        Self {
            origin: [0.0, 10.0],
            car_size: [1.0, 2.0],
            drive: DriveModel::Axis { step: 0.1 },
            track: TrackShape::Ring {
                center: [0.0, 0.0],
                inner_radius: 7.0,
                outer_radius: 13.0,
            },
            bindings: Bindings::arrows(),
            key_case: KeyCase::Raw,
            laps: None,
            camera: None,
            view_scale: 0.05,
            track_spin: 0.01,
        }
    }

    pub fn canvas() -> Self {
        Self {
            origin: [400.0, 550.0],
            car_size: [20.0, 30.0],
            drive: DriveModel::Axis { step: 2.0 },
            track: TrackShape::Ring {
                center: [400.0, 300.0],
                inner_radius: 100.0,
                outer_radius: 250.0,
            },
            bindings: Bindings::arrows(),
            key_case: KeyCase::Raw,
            laps: None,
            camera: None,
            view_scale: 1.0,
            track_spin: 0.0,
        }
    }

    pub fn circuit() -> Self {
        Self {
            origin: [0.0, -20.0],
            car_size: [1.0, 2.0],
            drive: DriveModel::Heading {
                acceleration: 0.01,
                max_forward: 0.5,
                max_reverse: 0.2,
                friction: 0.98,
                turn_rate: 0.03,
            },
            track: TrackShape::Walled {
                center: [0.0, 0.0],
                half_extents: [50.0, 50.0],
                wall_thickness: 1.0,
            },
            bindings: Bindings::wasd(),
            key_case: KeyCase::LowerLetters,
            laps: Some(LapRules {
                start_zone: Aabb::new(Vec2::ZERO, Vec2::new(10.0, 2.0)),
                exit_line: 3.0,
                half_width: 10.0,
                laps_to_win: 3,
            }),
            camera: Some(CameraRig::default()),
            view_scale: 0.06,
            track_spin: 0.0,
        }
    }

    /// Validate the parameters and turn them into a simulation setup.
    pub fn build(&self, variant: Variant) -> Result<RaceSetup, String> {
        let track = self.track.build()?;
        validate_drive(&self.drive)?;

        if self.bindings.iter().any(str::is_empty) {
            return Err(format!("key bindings must not be empty (got {:?})", self.bindings));
        }
        if let Some(laps) = &self.laps {
            if laps.laps_to_win == 0 {
                return Err("laps_to_win must be at least 1".to_string());
            }
            if laps.half_width < 0.0 {
                return Err(format!("lap half_width must not be negative (got {})", laps.half_width));
            }
        }
        if !(self.view_scale > 0.0) {
            return Err(format!("view_scale must be positive (got {})", self.view_scale));
        }

        let origin = Vec2::from(self.origin);
        let footprint = Vec2::from(self.car_size) * 0.5;
        if footprint.min_element() < 0.0 {
            return Err(format!("car_size must not be negative (got {:?})", self.car_size));
        }
        if !track.is_inside_track(origin, footprint) {
            return Err(format!("origin {origin} is outside the track"));
        }

        Ok(RaceSetup {
            variant,
            origin,
            footprint,
            drive: self.drive,
            track,
            bindings: self.bindings.clone(),
            key_case: self.key_case,
            laps: self.laps,
            camera: self.camera,
        })
    }
}

fn validate_drive(drive: &DriveModel) -> Result<(), String> {
    match *drive {
        DriveModel::Axis { step } => {
            if !(step > 0.0) {
                return Err(format!("axis step must be positive (got {step})"));
            }
        }
        DriveModel::Heading {
            acceleration,
            max_forward,
            max_reverse,
            friction,
            turn_rate,
        } => {
            if !(friction > 0.0 && friction < 1.0) {
                return Err(format!("friction must be in (0, 1) (got {friction})"));
            }
            if acceleration < 0.0 || max_forward < 0.0 || max_reverse < 0.0 {
                return Err(format!(
                    "acceleration and speed limits must not be negative (got {acceleration}, {max_forward}, {max_reverse})"
                ));
            }
            if !turn_rate.is_finite() {
                return Err(format!("turn_rate must be finite (got {turn_rate})"));
            }
        }
    }
    Ok(())
}

/// Top-level configuration file. A variant table that is present replaces
/// that variant's preset as a whole.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DemoConfig {
    /// Simulation ticks per second, independent of the display rate.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,
    #[serde(default = "VariantParams::orbit")]
    pub orbit: VariantParams,
    #[serde(default = "VariantParams::canvas")]
    pub canvas: VariantParams,
    #[serde(default = "VariantParams::circuit")]
    pub circuit: VariantParams,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            orbit: VariantParams::orbit(),
            canvas: VariantParams::canvas(),
            circuit: VariantParams::circuit(),
        }
    }
}

impl DemoConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&text).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }

    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))
    }

    pub fn params(&self, variant: Variant) -> &VariantParams {
        match variant {
            Variant::Orbit => &self.orbit,
            Variant::Canvas => &self.canvas,
            Variant::Circuit => &self.circuit,
        }
    }

    pub fn setup(&self, variant: Variant) -> Result<RaceSetup, String> {
        if !(self.tick_hz > 0.0 && self.tick_hz.is_finite()) {
            return Err(format!("tick_hz must be positive (got {})", self.tick_hz));
        }
        self.params(variant)
            .build(variant)
            .map_err(|e| format!("invalid {} parameters: {}", variant.title(), e))
    }
}
