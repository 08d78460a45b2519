//! Simulation configuration
//!
//! Every field has a default, so `{}` is a valid JSON config.

use crate::catalog::{Catalog, GpuModel};
use crate::economy::DEFAULT_PRICE_PER_KWH;
use crate::models::event::DEFAULT_EVENT_LOG_CAPACITY;
use crate::orchestrator::SimulationError;
use serde::{Deserialize, Serialize};

/// Rolling window of recent completions used for displayed SLA compliance
pub const DEFAULT_SLA_HISTORY_WINDOW: usize = 200;

/// Complete simulation configuration
///
/// # Example
///
/// ```rust
/// use gpu_tycoon_core::orchestrator::SimulationConfig;
///
/// let config: SimulationConfig = serde_json::from_str(r#"{"rng_seed": 7}"#).unwrap();
/// assert_eq!(config.rng_seed, 7);
/// assert_eq!(config.starting_cash, 3000.0);
/// assert!(config.auto_assign);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// RNG seed (same seed + same calls = same run)
    pub rng_seed: u64,

    pub starting_cash: f64,

    /// Model bought for free at construction, if any
    pub starter_accelerator: Option<GpuModel>,

    /// Seconds between job generation attempts before multipliers
    pub base_spawn_interval: f64,

    /// Run the scheduler every tick
    pub auto_assign: bool,

    pub electricity_price_per_kwh: f64,

    pub sla_history_window: usize,

    pub event_log_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            starting_cash: 3000.0,
            starter_accelerator: None,
            base_spawn_interval: 2.0,
            auto_assign: true,
            electricity_price_per_kwh: DEFAULT_PRICE_PER_KWH,
            sla_history_window: DEFAULT_SLA_HISTORY_WINDOW,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        }
    }
}

impl SimulationConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json).map_err(|e| SimulationError::InvalidConfig(e.to_string()))
    }

    /// Reject values the tick loop cannot work with
    pub fn validate(&self, catalog: &Catalog) -> Result<(), SimulationError> {
        if !self.starting_cash.is_finite() || self.starting_cash < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "starting_cash must be a non-negative number".to_string(),
            ));
        }
        if !self.base_spawn_interval.is_finite() || self.base_spawn_interval <= 0.0 {
            return Err(SimulationError::InvalidConfig(
                "base_spawn_interval must be positive".to_string(),
            ));
        }
        if !self.electricity_price_per_kwh.is_finite() || self.electricity_price_per_kwh < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "electricity_price_per_kwh must be non-negative".to_string(),
            ));
        }
        if self.sla_history_window == 0 {
            return Err(SimulationError::InvalidConfig(
                "sla_history_window must be at least 1".to_string(),
            ));
        }
        if self.event_log_capacity == 0 {
            return Err(SimulationError::InvalidConfig(
                "event_log_capacity must be at least 1".to_string(),
            ));
        }
        if let Some(model) = self.starter_accelerator {
            if catalog.accelerator(model).is_none() {
                return Err(SimulationError::InvalidConfig(format!(
                    "starter accelerator {model:?} is not in the catalog"
                )));
            }
        }
        Ok(())
    }
}
