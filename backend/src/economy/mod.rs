//! Derived infrastructure economics
//!
//! Cooling, PUE, networking and scheduler tier are not bought separately;
//! they follow from the fleet composition and lifetime revenue. Everything
//! here is a pure function of its inputs.

use crate::catalog::{AcceleratorSpec, Catalog, CoolingTier, GpuModel};
use crate::models::accelerator::Fleet;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default electricity price in dollars per kWh
pub const DEFAULT_PRICE_PER_KWH: f64 = 0.15;

#[derive(Debug, Error, PartialEq)]
pub enum PurchaseError {
    #[error("GPU type not found")]
    UnknownModel(GpuModel),

    #[error("Need ${0:.0}")]
    InsufficientFunds(f64),

    #[error("Unlock at ${0:.0} revenue")]
    Locked(f64),
}

/// Highest cooling tier any owned accelerator needs (air for an empty fleet)
pub fn current_cooling_tier(fleet: &Fleet) -> CoolingTier {
    fleet
        .values()
        .map(|a| a.cooling())
        .max()
        .unwrap_or(CoolingTier::Air)
}

/// Facility PUE implied by the fleet's cooling tier
pub fn current_pue(fleet: &Fleet) -> f64 {
    current_cooling_tier(fleet).pue()
}

/// Duration stretch for a placement spanning mixed accelerator types
///
/// Networking upgrades itself as the fleet grows.
pub fn network_penalty(fleet_size: usize) -> f64 {
    match fleet_size {
        0..=4 => 0.25,
        5..=12 => 0.15,
        13..=24 => 0.08,
        _ => 0.03,
    }
}

/// Electricity cost of running the fleet for `dt` seconds
///
/// `Σ(power × utilization) / 1000 × PUE × price / 3600 × dt`
pub fn power_cost(fleet: &Fleet, pue: f64, dt: f64, price_per_kwh: f64) -> f64 {
    let watts: f64 = fleet
        .values()
        .map(|a| a.power_watts() * a.utilization())
        .sum();
    watts / 1000.0 * pue * price_per_kwh / 3600.0 * dt
}

/// Scheduler tier shown to the player; unlocked by lifetime revenue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerTier {
    Fifo,
    Priority,
    Backfill,
    Preemptive,
}

impl SchedulerTier {
    pub fn for_revenue(total_revenue: f64) -> Self {
        if total_revenue >= 400_000.0 {
            SchedulerTier::Preemptive
        } else if total_revenue >= 150_000.0 {
            SchedulerTier::Backfill
        } else if total_revenue >= 50_000.0 {
            SchedulerTier::Priority
        } else {
            SchedulerTier::Fifo
        }
    }
}

impl fmt::Display for SchedulerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerTier::Fifo => "fifo",
            SchedulerTier::Priority => "priority",
            SchedulerTier::Backfill => "backfill",
            SchedulerTier::Preemptive => "preemptive",
        };
        f.write_str(name)
    }
}

/// Models whose revenue unlock has been reached, in catalog order
pub fn unlocked_models(catalog: &Catalog, total_revenue: f64) -> Vec<GpuModel> {
    catalog
        .accelerators
        .iter()
        .filter(|spec| total_revenue >= spec.unlock_revenue)
        .map(|spec| spec.model)
        .collect()
}

/// Check that `spec` is affordable and unlocked
///
/// Cash is checked before the unlock gate.
pub fn check_purchase(
    spec: &AcceleratorSpec,
    cash: f64,
    total_revenue: f64,
) -> Result<(), PurchaseError> {
    if cash < spec.cost {
        return Err(PurchaseError::InsufficientFunds(spec.cost));
    }
    if total_revenue < spec.unlock_revenue {
        return Err(PurchaseError::Locked(spec.unlock_revenue));
    }
    Ok(())
}
