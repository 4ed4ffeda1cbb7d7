use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::track::Aabb;

/// Start/finish geometry.
///
/// Entering `start_zone` arms the counter; a lap is counted once the car is
/// past `exit_line` (forward along +Y) within `half_width` of the zone's
/// centre line.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct LapRules {
    pub start_zone: Aabb,
    pub exit_line: f32,
    pub half_width: f32,
    pub laps_to_win: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapEvent {
    Completed { lap: u32 },
    /// `laps_to_win` reached; the counter has already gone back to zero.
    Won { laps: u32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LapCounter {
    pub laps: u32,
    pub armed: bool,
}

impl LapCounter {
    pub fn update(&mut self, position: Vec2, rules: &LapRules) -> Option<LapEvent> {
        if rules.start_zone.contains_point(position) {
            self.armed = true;
            return None;
        }

        let lateral = (position.x - rules.start_zone.center[0]).abs();
        if !self.armed || position.y <= rules.exit_line || lateral > rules.half_width {
            return None;
        }

        self.armed = false;
        self.laps += 1;
        if self.laps >= rules.laps_to_win {
            let laps = self.laps;
            self.laps = 0;
            Some(LapEvent::Won { laps })
        } else {
            Some(LapEvent::Completed { lap: self.laps })
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::Vec2;

    use super::{LapCounter, LapEvent, LapRules};
    use crate::track::Aabb;

    fn rules() -> LapRules {
        LapRules {
            start_zone: Aabb::new(Vec2::ZERO, Vec2::new(10.0, 2.0)),
            exit_line: 3.0,
            half_width: 10.0,
            laps_to_win: 3,
        }
    }

    const BEFORE: Vec2 = Vec2::new(0.0, -20.0);
    const IN_ZONE: Vec2 = Vec2::new(0.0, 0.0);
    const BETWEEN: Vec2 = Vec2::new(0.0, 2.5);
    const PAST: Vec2 = Vec2::new(0.0, 4.0);

    fn drive_through(counter: &mut LapCounter, path: &[Vec2]) -> Vec<LapEvent> {
        path.iter()
            .filter_map(|position| counter.update(*position, &rules()))
            .collect()
    }

    #[test]
    fn exit_without_arming_does_not_count() {
        let mut counter = LapCounter::default();
        assert!(drive_through(&mut counter, &[BEFORE, PAST, BETWEEN, PAST]).is_empty());
        assert_eq!(counter.laps, 0);
        assert!(!counter.armed);
    }

    #[test]
    fn one_lap_per_full_cycle() {
        let mut counter = LapCounter::default();
        let events = drive_through(&mut counter, &[BEFORE, IN_ZONE, BETWEEN, PAST, PAST]);
        assert_eq!(events, vec![LapEvent::Completed { lap: 1 }]);
        assert_eq!(counter.laps, 1);
        assert!(!counter.armed);
    }

    #[test]
    fn reentering_the_zone_does_not_double_count() {
        let mut counter = LapCounter::default();
        let events = drive_through(
            &mut counter,
            &[IN_ZONE, BETWEEN, IN_ZONE, BETWEEN, IN_ZONE, BEFORE, IN_ZONE],
        );
        assert!(events.is_empty());
        assert!(counter.armed);

        let events = drive_through(&mut counter, &[PAST]);
        assert_eq!(events, vec![LapEvent::Completed { lap: 1 }]);
    }

    #[test]
    fn exit_outside_the_start_line_span_is_ignored() {
        let mut counter = LapCounter::default();
        let events = drive_through(&mut counter, &[IN_ZONE, Vec2::new(30.0, 4.0)]);
        assert!(events.is_empty());
        assert!(counter.armed);
    }

    #[test]
    fn third_lap_wins_and_resets_on_the_same_tick() {
        let mut counter = LapCounter::default();
        let lap = [IN_ZONE, PAST];
        assert_eq!(
            drive_through(&mut counter, &lap),
            vec![LapEvent::Completed { lap: 1 }]
        );
        assert_eq!(
            drive_through(&mut counter, &lap),
            vec![LapEvent::Completed { lap: 2 }]
        );
        assert_eq!(
            drive_through(&mut counter, &lap),
            vec![LapEvent::Won { laps: 3 }]
        );
        assert_eq!(counter, LapCounter::default());

        assert_eq!(
            drive_through(&mut counter, &lap),
            vec![LapEvent::Completed { lap: 1 }]
        );
    }
}
