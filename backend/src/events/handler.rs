//! Demand spike triggering and expiry
//!
//! The monitor runs at the top of every tick. It rolls for a new spike on a
//! fixed simulated-time period and counts down the active one.

use crate::events::types::{DemandSpike, SpikeKind};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};

/// Seconds between spike rolls
pub const SPIKE_CHECK_PERIOD: f64 = 60.0;
/// Probability a roll starts a spike
pub const SPIKE_PROBABILITY: f64 = 0.2;
/// Lifetime revenue below which no spike can start
pub const SPIKE_REVENUE_FLOOR: f64 = 10_000.0;

/// What changed during one monitor update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpikeUpdate {
    pub started: Option<SpikeKind>,
    pub ended: Option<SpikeKind>,
}

/// Owns the active spike and the roll timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeMonitor {
    active: Option<DemandSpike>,
    last_check: f64,
}

impl SpikeMonitor {
    pub fn new(now: f64) -> Self {
        Self {
            active: None,
            last_check: now,
        }
    }

    pub fn active(&self) -> Option<&DemandSpike> {
        self.active.as_ref()
    }

    /// Spawn multiplier of the active spike (1.0 when none)
    pub fn spawn_multiplier(&self) -> f64 {
        self.active.as_ref().map_or(1.0, DemandSpike::spawn_multiplier)
    }

    /// Value multiplier of the active spike (1.0 when none)
    pub fn value_multiplier(&self) -> f64 {
        self.active.as_ref().map_or(1.0, DemandSpike::value_multiplier)
    }

    /// Start `kind` now unless a spike is already running
    ///
    /// Returns whether the spike started. The roll timer is left alone.
    pub fn trigger(&mut self, kind: SpikeKind) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(DemandSpike::new(kind));
        true
    }

    /// Roll for a new spike if the period elapsed, then age the active one
    ///
    /// The roll is skipped (and draws no randomness) while a spike is active
    /// or below the revenue floor, but the period still restarts.
    pub fn update(
        &mut self,
        now: f64,
        dt: f64,
        total_revenue: f64,
        rng: &mut RngManager,
    ) -> SpikeUpdate {
        let mut update = SpikeUpdate::default();

        if now - self.last_check >= SPIKE_CHECK_PERIOD {
            self.last_check = now;
            if self.active.is_none()
                && total_revenue >= SPIKE_REVENUE_FLOOR
                && rng.chance(SPIKE_PROBABILITY)
            {
                if let Some(&kind) = rng.choose(&SpikeKind::ALL) {
                    self.active = Some(DemandSpike::new(kind));
                    update.started = Some(kind);
                }
            }
        }

        if let Some(spike) = self.active.as_mut() {
            spike.time_remaining -= dt;
            if spike.is_expired() {
                update.ended = Some(spike.kind);
                self.active = None;
            }
        }

        update
    }
}
