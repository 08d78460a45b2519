//! Time management for the simulation
//!
//! The simulation is advanced by externally supplied deltas (seconds).
//! The clock is the sum of every delta applied so far, so every timestamp
//! in the domain (job creation, SLA deadline, start time, spawn timer) is a
//! pure function of the tick history.

use serde::{Deserialize, Serialize};

/// Accumulated simulated time in seconds
///
/// # Example
/// ```
/// use gpu_tycoon_core::SimClock;
///
/// let mut clock = SimClock::new();
/// assert_eq!(clock.now(), 0.0);
///
/// clock.advance(0.5);
/// clock.advance(1.5);
/// assert_eq!(clock.now(), 2.0);
/// assert_eq!(clock.elapsed_since(0.5), 1.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Seconds elapsed since the simulation started
    now: f64,

    /// Number of deltas applied
    ticks: u64,
}

impl SimClock {
    /// Create a clock at t = 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `dt` seconds
    ///
    /// Callers validate `dt` (finite, non-negative) before advancing.
    pub fn advance(&mut self, dt: f64) {
        self.now += dt;
        self.ticks += 1;
    }

    /// Current simulated time in seconds
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Number of ticks applied so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Seconds elapsed since `earlier`
    pub fn elapsed_since(&self, earlier: f64) -> f64 {
        self.now - earlier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accumulates_and_counts_ticks() {
        let mut clock = SimClock::new();
        for _ in 0..4 {
            clock.advance(0.25);
        }
        assert_eq!(clock.now(), 1.0);
        assert_eq!(clock.ticks(), 4);
    }

    #[test]
    fn test_zero_delta_still_counts_as_tick() {
        let mut clock = SimClock::new();
        clock.advance(0.0);
        assert_eq!(clock.now(), 0.0);
        assert_eq!(clock.ticks(), 1);
    }
}
