//! Probe result producers.
//!
//! The only producer today is [`SyntheticProbe`], which fabricates plausible
//! numbers until a real health-check pipeline feeds the table.

use rand::Rng;

use crate::models::ProbeResult;

/// Checks run per interval; passes + fails always add up to this.
const CHECKS_PER_INTERVAL: i64 = 15;

// ---

/// Source of one interval's worth of probe results.
pub trait ProbeSource: Send + Sync {
    fn sample(&self) -> ProbeResult;
}

/// Random results with `rl <= ra <= rh`, in seconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticProbe;

impl ProbeSource for SyntheticProbe {
    fn sample(&self) -> ProbeResult {
        // ---
        let mut rng = rand::thread_rng();
        let fails = rng.gen_range(3..=6);

        ProbeResult {
            passes: CHECKS_PER_INTERVAL - fails,
            fails,
            runtime_low: millis(rng.gen_range(100..=300)),
            runtime_avg: millis(rng.gen_range(300..=600)),
            runtime_high: millis(rng.gen_range(600..=2500)),
        }
    }
}

fn millis(ms: u32) -> f64 {
    f64::from(ms) / 1000.0
}

/// Always returns the same result. Handy wherever deterministic rows matter.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub ProbeResult);

impl ProbeSource for FixedProbe {
    fn sample(&self) -> ProbeResult {
        self.0
    }
}
