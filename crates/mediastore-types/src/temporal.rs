use std::sync::Mutex;

use chrono::{DateTime, Duration, DurationRound, Utc};

/// Source of publish timestamps.
///
/// Timestamps have millisecond precision and strictly increase for the life
/// of the clock, even when the wall clock steps backwards or two publishes
/// land in the same millisecond.
#[derive(Debug, Default)]
pub struct PublishClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl PublishClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp, strictly after every timestamp previously returned.
    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now();
        let wall = wall.duration_trunc(Duration::milliseconds(1)).unwrap_or(wall);
        self.advance(wall)
    }

    fn advance(&self, wall: DateTime<Utc>) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let next = match *last {
            Some(prev) if wall <= prev => prev + Duration::milliseconds(1),
            _ => wall,
        };
        *last = Some(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_is_strictly_increasing() {
        let clock = PublishClock::new();
        let mut prev = clock.now();
        for _ in 0..100 {
            let next = clock.now();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn wall_clock_step_back_is_absorbed() {
        let clock = PublishClock::new();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap();
        assert_eq!(clock.advance(t1), t1);
        assert_eq!(clock.advance(earlier), t1 + Duration::milliseconds(1));
    }

    #[test]
    fn now_has_millisecond_precision() {
        let clock = PublishClock::new();
        let t = clock.now();
        assert_eq!(t.timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
