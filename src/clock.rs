//! Interval alignment for the fixed probe cadence.

use chrono::Utc;

/// Default cadence: one probe interval every 15 minutes.
pub const DEFAULT_CADENCE_SECS: i64 = 900;

// ---

/// Maps wall-clock time onto the interval grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalClock {
    cadence: i64,
}

impl IntervalClock {
    // ---
    /// `cadence` is in seconds and must be positive (enforced by `Config`).
    pub fn new(cadence: i64) -> Self {
        debug_assert!(cadence > 0, "cadence must be positive");
        Self { cadence }
    }

    pub fn cadence(&self) -> i64 {
        self.cadence
    }

    /// Floor `ts` to the start of its interval.
    pub fn align(&self, ts: i64) -> i64 {
        ts.div_euclid(self.cadence) * self.cadence
    }

    pub fn is_aligned(&self, ts: i64) -> bool {
        ts.rem_euclid(self.cadence) == 0
    }

    /// Start of the interval containing "now".
    pub fn current_interval(&self) -> i64 {
        self.align(Utc::now().timestamp())
    }
}

impl Default for IntervalClock {
    fn default() -> Self {
        Self::new(DEFAULT_CADENCE_SECS)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_align_floors_to_boundary() {
        // ---
        let clock = IntervalClock::default();
        assert_eq!(clock.align(1_700_000_000), 1_699_999_200);
        assert_eq!(clock.align(1_699_999_200), 1_699_999_200);
        assert_eq!(clock.align(1_699_999_200 + 899), 1_699_999_200);
        assert_eq!(clock.align(0), 0);
    }

    #[test]
    fn test_align_properties_hold_across_range() {
        // ---
        let clock = IntervalClock::default();
        for now in (1_600_000_000..1_600_010_000).step_by(37) {
            let aligned = clock.align(now);
            assert_eq!(aligned % DEFAULT_CADENCE_SECS, 0);
            assert!(aligned <= now);
            assert!(now < aligned + DEFAULT_CADENCE_SECS);
        }
    }

    #[test]
    fn test_negative_timestamps_floor_downwards() {
        // ---
        let clock = IntervalClock::default();
        assert_eq!(clock.align(-1), -900);
        assert!(clock.is_aligned(-900));
    }

    #[test]
    fn test_current_interval_is_aligned() {
        // ---
        let clock = IntervalClock::new(60);
        let now = clock.current_interval();
        assert!(clock.is_aligned(now));
        assert!(now <= Utc::now().timestamp());
    }
}
