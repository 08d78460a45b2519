//! Marketing ladder progression
//!
//! The current rung scales how often jobs arrive, how much they pay and how
//! much SLA slack they carry.

use crate::catalog::MarketingTier;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MarketingError {
    #[error("Max marketing level reached")]
    MaxLevel,

    #[error("Unlock at ${0:.0} total revenue")]
    Locked(f64),

    #[error("Need ${0:.0}")]
    InsufficientFunds(f64),
}

/// Tracks the purchased marketing level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingManager {
    level: u32,
    tiers: Vec<MarketingTier>,
}

impl MarketingManager {
    /// Start at level 0 of `tiers`
    pub fn new(tiers: Vec<MarketingTier>) -> Self {
        Self { level: 0, tiers }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn current(&self) -> Option<&MarketingTier> {
        self.tiers.get(self.level as usize)
    }

    /// The tier an upgrade would buy, `None` at the top
    pub fn next(&self) -> Option<&MarketingTier> {
        self.tiers.get(self.level as usize + 1)
    }

    pub fn spawn_multiplier(&self) -> f64 {
        self.current().map_or(1.0, |t| t.spawn_multiplier)
    }

    pub fn value_multiplier(&self) -> f64 {
        self.current().map_or(1.0, |t| t.value_multiplier)
    }

    pub fn sla_extension(&self) -> f64 {
        self.current().map_or(0.0, |t| t.sla_extension)
    }

    /// Check whether the next tier is affordable and unlocked
    pub fn can_upgrade(&self, cash: f64, total_revenue: f64) -> Result<&MarketingTier, MarketingError> {
        let next = self.next().ok_or(MarketingError::MaxLevel)?;
        if total_revenue < next.unlock_revenue {
            return Err(MarketingError::Locked(next.unlock_revenue));
        }
        if cash < next.cost {
            return Err(MarketingError::InsufficientFunds(next.cost));
        }
        Ok(next)
    }

    /// Move up one level and return the tier bought
    ///
    /// The caller deducts `tier.cost` from cash.
    pub fn upgrade(&mut self, cash: f64, total_revenue: f64) -> Result<MarketingTier, MarketingError> {
        let tier = self.can_upgrade(cash, total_revenue)?.clone();
        self.level += 1;
        Ok(tier)
    }
}
