use std::path::Path;

use bevy::math::Vec2;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::Car;
use crate::camera::CameraRig;
use crate::config::Variant;
use crate::drive::DriveModel;
use crate::input::{Bindings, InputLatch, KeyCase};
use crate::lap::{LapCounter, LapEvent, LapRules};
use crate::track::{Track, correct_on_violation};

/// Immutable description of one demo, fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct RaceSetup {
    pub variant: Variant,
    pub origin: Vec2,
    /// Half extents of the car body, used by walled tracks.
    pub footprint: Vec2,
    pub drive: DriveModel,
    pub track: Track,
    pub bindings: Bindings,
    pub key_case: KeyCase,
    pub laps: Option<LapRules>,
    pub camera: Option<CameraRig>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceState {
    pub car: Car,
    pub laps: LapCounter,
    pub tick: u64,
}

impl RaceState {
    pub fn start(setup: &RaceSetup) -> Self {
        Self {
            car: Car::parked_at(setup.origin),
            laps: LapCounter::default(),
            tick: 0,
        }
    }
}

/// What happened during a tick, beyond the new state itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub reset: bool,
    pub lap: Option<LapEvent>,
}

/// One logical tick: controls, friction and integration, boundary
/// correction, then the lap check. A car that starts the tick off the track
/// is reset even if this tick's movement would carry it back on. A tick that
/// resets the car never counts a lap.
pub fn step(setup: &RaceSetup, state: &RaceState, latch: &InputLatch) -> (RaceState, TickReport) {
    let controls = setup.bindings.read(latch);
    let moved = setup.drive.drive(&state.car, controls);
    let (car, reset) = if setup.track.is_inside_track(state.car.position, setup.footprint) {
        correct_on_violation(moved, &setup.track, setup.footprint, setup.origin)
    } else {
        (Car::parked_at(setup.origin), true)
    };

    let mut laps = state.laps;
    let lap = match &setup.laps {
        Some(rules) if !reset => laps.update(car.position, rules),
        _ => None,
    };

    let next = RaceState {
        car,
        laps,
        tick: state.tick + 1,
    };
    (next, TickReport { reset, lap })
}

/// Owns the race state between ticks and keeps running totals.
#[derive(Resource, Debug, Clone)]
pub struct Session {
    setup: RaceSetup,
    state: RaceState,
    resets: u32,
    wins: u32,
}

impl Session {
    pub fn new(setup: RaceSetup) -> Self {
        let state = RaceState::start(&setup);
        Self {
            setup,
            state,
            resets: 0,
            wins: 0,
        }
    }

    pub fn setup(&self) -> &RaceSetup {
        &self.setup
    }

    pub fn state(&self) -> &RaceState {
        &self.state
    }

    pub fn tick(&mut self, latch: &InputLatch) -> TickReport {
        let (next, report) = step(&self.setup, &self.state, latch);
        self.state = next;
        trace!(
            tick = next.tick,
            x = next.car.position.x,
            y = next.car.position.y,
            heading = next.car.heading,
            speed = next.car.speed,
            held = ?latch.held().collect::<Vec<_>>(),
            "tick"
        );

        if report.reset {
            self.resets += 1;
            debug!(tick = next.tick, "car left the track, back to the start");
        }
        match report.lap {
            Some(LapEvent::Completed { lap }) => info!(tick = next.tick, lap, "lap completed"),
            Some(LapEvent::Won { laps }) => {
                self.wins += 1;
                info!(tick = next.tick, laps, "race won");
            }
            None => {}
        }
        report
    }

    /// Run a scripted sequence of held keys, one segment after another.
    pub fn run_script(&mut self, script: &InputScript) -> RunSummary {
        let mut latch = InputLatch::default();
        let mut lap_events = Vec::new();
        for segment in &script.segments {
            latch.release_all();
            for key in &segment.keys {
                latch.set_key(self.setup.key_case.normalize(key), true);
            }
            for _ in 0..segment.ticks {
                if let Some(event) = self.tick(&latch).lap {
                    lap_events.push(LapRecord::new(self.state.tick, event));
                }
            }
        }
        RunSummary {
            lap_events,
            ..self.summary()
        }
    }

    pub fn summary(&self) -> RunSummary {
        let car = self.state.car;
        RunSummary {
            variant: self.setup.variant,
            ticks: self.state.tick,
            position: car.position.to_array(),
            heading: car.heading,
            speed: car.speed,
            laps: self.state.laps.laps,
            resets: self.resets,
            wins: self.wins,
            lap_events: Vec::new(),
        }
    }
}

/// Held keys for a number of ticks.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScriptSegment {
    pub ticks: u32,
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Input recording for headless runs:
///
/// ```toml
/// [[segment]]
/// ticks = 10
/// keys = ["ArrowUp"]
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct InputScript {
    #[serde(rename = "segment", default)]
    pub segments: Vec<ScriptSegment>,
}

impl InputScript {
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&text).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }

    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    pub fn total_ticks(&self) -> u64 {
        self.segments.iter().map(|s| u64::from(s.ticks)).sum()
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct LapRecord {
    pub tick: u64,
    pub lap: u32,
    pub won: bool,
}

impl LapRecord {
    fn new(tick: u64, event: LapEvent) -> Self {
        match event {
            LapEvent::Completed { lap } => Self {
                tick,
                lap,
                won: false,
            },
            LapEvent::Won { laps } => Self {
                tick,
                lap: laps,
                won: true,
            },
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub variant: Variant,
    pub ticks: u64,
    pub position: [f32; 2],
    pub heading: f32,
    pub speed: f32,
    pub laps: u32,
    pub resets: u32,
    pub wins: u32,
    pub lap_events: Vec<LapRecord>,
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use bevy::math::Vec2;

    use super::{InputScript, RaceState, Session, step};
    use crate::Car;
    use crate::config::{DemoConfig, Variant, VariantParams};
    use crate::input::InputLatch;
    use crate::lap::{LapCounter, LapEvent};

    fn session(variant: Variant) -> Session {
        Session::new(DemoConfig::default().setup(variant).unwrap())
    }

    #[test]
    fn canvas_up_for_ten_ticks() {
        let mut session = session(Variant::Canvas);
        let mut latch = InputLatch::default();
        latch.set_key("ArrowUp", true);

        for _ in 0..10 {
            let report = session.tick(&latch);
            assert!(!report.reset);
        }

        let car = session.state().car;
        assert_eq!(car.position, Vec2::new(400.0, 530.0));
        assert_eq!(car.speed, 2.0);
        assert_eq!(car.heading, 0.0);
        let center = Vec2::new(400.0, 300.0);
        assert_eq!(car.position.distance(center), 230.0);
    }

    #[test]
    fn step_is_pure() {
        let setup = DemoConfig::default().setup(Variant::Circuit).unwrap();
        let state = RaceState::start(&setup);
        let mut latch = InputLatch::default();
        latch.set_key("w", true);
        latch.set_key("a", true);

        let first = step(&setup, &state, &latch);
        let second = step(&setup, &state, &latch);
        assert_eq!(first, second);
        assert_eq!(state, RaceState::start(&setup));
    }

    #[test]
    fn off_track_state_resets_on_the_next_tick() {
        for variant in [Variant::Orbit, Variant::Canvas, Variant::Circuit] {
            let setup = DemoConfig::default().setup(variant).unwrap();
            let outside = match variant {
                Variant::Orbit => Vec2::new(0.0, 0.5),
                Variant::Canvas => Vec2::new(400.0, 300.0),
                Variant::Circuit => Vec2::new(49.9, 0.0),
            };
            let state = RaceState {
                car: Car {
                    position: outside,
                    heading: 1.2,
                    speed: setup.drive.max_forward(),
                },
                ..RaceState::start(&setup)
            };

            let (next, report) = step(&setup, &state, &InputLatch::default());
            assert!(report.reset, "{variant:?} did not reset");
            assert_eq!(next.car, Car::parked_at(setup.origin));
        }
    }

    #[test]
    fn off_track_state_resets_even_when_steered_back_inside() {
        let orbit = DemoConfig::default().setup(Variant::Orbit).unwrap();
        let mut latch = InputLatch::default();
        latch.set_key("ArrowUp", true);
        let state = RaceState {
            car: Car::parked_at(Vec2::new(0.0, 13.05)),
            ..RaceState::start(&orbit)
        };
        let (next, report) = step(&orbit, &state, &latch);
        assert!(report.reset);
        assert_eq!(next.car, Car::parked_at(orbit.origin));

        let circuit = DemoConfig::default().setup(Variant::Circuit).unwrap();
        let state = RaceState {
            car: Car {
                position: Vec2::new(49.9, 0.0),
                heading: -FRAC_PI_2,
                speed: 0.5,
            },
            ..RaceState::start(&circuit)
        };
        let (next, report) = step(&circuit, &state, &InputLatch::default());
        assert!(report.reset);
        assert_eq!(next.car, Car::parked_at(circuit.origin));
    }

    #[test]
    fn reset_tick_never_counts_a_lap() {
        // Origin past the exit line, so landing there would otherwise complete a lap.
        let mut params = VariantParams::circuit();
        params.origin = [0.0, 10.0];
        let setup = params.build(Variant::Circuit).unwrap();

        let state = RaceState {
            car: Car {
                position: Vec2::new(0.0, 48.8),
                heading: 0.0,
                speed: 0.5,
            },
            laps: LapCounter {
                laps: 1,
                armed: true,
            },
            tick: 0,
        };
        let (next, report) = step(&setup, &state, &InputLatch::default());
        assert!(report.reset);
        assert_eq!(next.car, Car::parked_at(setup.origin));
        assert_eq!(report.lap, None);
        assert_eq!(
            next.laps,
            LapCounter {
                laps: 1,
                armed: true,
            }
        );
    }

    #[test]
    fn orbit_leaving_the_ring_snaps_back() {
        let mut session = session(Variant::Orbit);
        let mut latch = InputLatch::default();
        latch.set_key("ArrowDown", true);

        // About 30 ticks of 0.1 take z from 10 past 13, the outer edge.
        let mut resets = 0;
        for _ in 0..40 {
            if session.tick(&latch).reset {
                resets += 1;
            }
        }
        assert_eq!(resets, 1);
        let position = session.state().car.position;
        assert_eq!(position.x, 0.0);
        assert!(position.y > 10.0 && position.y < 11.1);
    }

    #[test]
    fn circuit_keys_are_case_insensitive_in_scripts() {
        let script = InputScript::from_toml(
            r#"
            [[segment]]
            ticks = 5
            keys = ["W"]
            "#,
        )
        .unwrap();
        let summary = session(Variant::Circuit).run_script(&script);
        assert_eq!(summary.ticks, 5);
        assert!(summary.speed > 0.0);
        assert!(summary.position[1] > -20.0);
    }

    #[test]
    fn flooring_it_through_the_start_line_three_times_wins() {
        let mut session = session(Variant::Circuit);
        let mut latch = InputLatch::default();
        latch.set_key("w", true);

        let mut events = Vec::new();
        let mut resets = 0;
        for _ in 0..1000 {
            let report = session.tick(&latch);
            if report.reset {
                resets += 1;
            }
            if let Some(event) = report.lap {
                events.push(event);
            }
            if matches!(report.lap, Some(LapEvent::Won { .. })) {
                break;
            }
        }

        assert_eq!(
            events,
            vec![
                LapEvent::Completed { lap: 1 },
                LapEvent::Completed { lap: 2 },
                LapEvent::Won { laps: 3 },
            ]
        );
        assert_eq!(resets, 2);
        assert_eq!(session.state().laps.laps, 0);
        assert_eq!(session.summary().wins, 1);
    }

    #[test]
    fn script_segments_release_keys_between_segments() {
        let script = InputScript::from_toml(
            r#"
            [[segment]]
            ticks = 10
            keys = ["ArrowUp"]

            [[segment]]
            ticks = 4
            "#,
        )
        .unwrap();
        assert_eq!(script.total_ticks(), 14);

        let summary = session(Variant::Canvas).run_script(&script);
        assert_eq!(summary.position, [400.0, 530.0]);
        assert_eq!(summary.speed, 0.0);
        assert_eq!(summary.resets, 0);
        assert!(summary.lap_events.is_empty());
    }
}
