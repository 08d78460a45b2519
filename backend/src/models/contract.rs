//! Enterprise contracts
//!
//! One [`Contract`] exists per catalog entry. A contract moves through
//! `Available -> Negotiating -> Active -> Expired`; negotiation advances only
//! by investing cash, and activation reserves accelerators that the
//! scheduler must then leave alone.

use crate::catalog::{Catalog, ContractSpec, CoolingTier, SECONDS_PER_MONTH};
use crate::models::accelerator::{AcceleratorId, Fleet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Aggregate fleet facts a contract's requirements are checked against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FleetProfile {
    pub accelerators: usize,
    pub h100_class: usize,
    pub cooling: CoolingTier,
    pub total_revenue: f64,
}

/// Contract lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContractStatus {
    Available,

    Negotiating {
        started_at: f64,
    },

    Active {
        reserved: Vec<AcceleratorId>,
        /// Seconds until the contract expires
        remaining_secs: f64,
    },

    Expired,
}

impl ContractStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ContractStatus::Available => "available",
            ContractStatus::Negotiating { .. } => "negotiating",
            ContractStatus::Active { .. } => "active",
            ContractStatus::Expired => "expired",
        }
    }
}

/// Errors that can occur during contract operations
#[derive(Debug, Error, PartialEq)]
pub enum ContractError {
    #[error("Contract not found")]
    NotFound(String),

    #[error("Contract not available")]
    NotAvailable,

    #[error("Requirements not met: {}", .0.join(", "))]
    RequirementsNotMet(Vec<String>),

    #[error("Contract not in negotiation")]
    NotNegotiating,

    #[error("Investment must be a positive amount")]
    InvalidAmount,

    #[error("Need ${needed:.0}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("Not enough available GPUs! Need {needed}, have {available}")]
    NotEnoughAccelerators { needed: usize, available: usize },

    #[error("Negotiation not complete")]
    NegotiationIncomplete,

    #[error("Need exactly {expected} GPUs to reserve")]
    WrongReservationSize { expected: usize, got: usize },
}

/// What an active contract produced during one update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractAccrual {
    pub income: f64,
    /// Reservation released because the contract just expired
    pub released: Option<Vec<AcceleratorId>>,
}

/// A single enterprise contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    spec: ContractSpec,
    status: ContractStatus,
    money_invested: f64,
}

impl Contract {
    pub fn new(spec: ContractSpec) -> Self {
        Self {
            spec,
            status: ContractStatus::Available,
            money_invested: 0.0,
        }
    }

    pub fn spec(&self) -> &ContractSpec {
        &self.spec
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn status(&self) -> &ContractStatus {
        &self.status
    }

    pub fn money_invested(&self) -> f64 {
        self.money_invested
    }

    /// Fraction of the negotiation cost paid so far, [0, 1]
    pub fn negotiation_progress(&self) -> f64 {
        (self.money_invested / self.spec.negotiation_cost_total).min(1.0)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, ContractStatus::Active { .. })
    }

    /// Accelerators held by this contract (empty unless active)
    pub fn reserved(&self) -> &[AcceleratorId] {
        match &self.status {
            ContractStatus::Active { reserved, .. } => reserved,
            _ => &[],
        }
    }

    /// Contract months left (full duration until activation, 0 once expired)
    pub fn months_remaining(&self) -> f64 {
        match &self.status {
            ContractStatus::Active { remaining_secs, .. } => remaining_secs / SECONDS_PER_MONTH,
            ContractStatus::Expired => 0.0,
            _ => f64::from(self.spec.duration_months),
        }
    }

    /// Human-readable list of unmet requirements (empty when eligible)
    pub fn check_requirements(&self, fleet: &FleetProfile) -> Vec<String> {
        let spec = &self.spec;
        let mut issues = Vec::new();

        if fleet.accelerators < spec.min_gpus {
            issues.push(format!(
                "Need {} GPUs (have {})",
                spec.min_gpus, fleet.accelerators
            ));
        }
        if fleet.h100_class < spec.min_h100s {
            issues.push(format!(
                "Need {} H100+ GPUs (have {})",
                spec.min_h100s, fleet.h100_class
            ));
        }
        if let Some(network) = spec.network {
            if fleet.accelerators < network.min_fleet_size() {
                issues.push(format!(
                    "Need {}+ GPUs for {} networking (auto-unlocks)",
                    network.min_fleet_size(),
                    network
                ));
            }
        }
        if let Some(cooling) = spec.cooling {
            if fleet.cooling < cooling {
                issues.push(format!("Need {} cooling (buy GPUs that require it)", cooling));
            }
        }
        if fleet.total_revenue < spec.min_revenue {
            issues.push(format!("Need ${:.0} total revenue", spec.min_revenue));
        }

        issues
    }

    /// Open negotiation if the contract is available and the fleet qualifies
    pub fn start_negotiation(&mut self, fleet: &FleetProfile, now: f64) -> Result<(), ContractError> {
        if self.status != ContractStatus::Available {
            return Err(ContractError::NotAvailable);
        }
        let issues = self.check_requirements(fleet);
        if !issues.is_empty() {
            return Err(ContractError::RequirementsNotMet(issues));
        }
        self.status = ContractStatus::Negotiating { started_at: now };
        self.money_invested = 0.0;
        Ok(())
    }

    /// Whether investing `amount` would finish the negotiation
    pub fn would_complete(&self, amount: f64) -> bool {
        self.money_invested + amount >= self.spec.negotiation_cost_total
    }

    /// Put money into the negotiation; returns true once it is complete
    ///
    /// Cash is the caller's concern; this only validates the contract side.
    pub fn invest(&mut self, amount: f64) -> Result<bool, ContractError> {
        if !matches!(self.status, ContractStatus::Negotiating { .. }) {
            return Err(ContractError::NotNegotiating);
        }
        if !(amount > 0.0) || !amount.is_finite() {
            return Err(ContractError::InvalidAmount);
        }
        self.money_invested += amount;
        Ok(self.can_activate())
    }

    pub fn can_activate(&self) -> bool {
        matches!(self.status, ContractStatus::Negotiating { .. })
            && self.money_invested >= self.spec.negotiation_cost_total
    }

    /// Start the contract with exactly `reserves_gpus` accelerators
    pub fn activate(&mut self, reserved: Vec<AcceleratorId>) -> Result<(), ContractError> {
        if !self.can_activate() {
            return Err(ContractError::NegotiationIncomplete);
        }
        if reserved.len() != self.spec.reserves_gpus {
            return Err(ContractError::WrongReservationSize {
                expected: self.spec.reserves_gpus,
                got: reserved.len(),
            });
        }
        self.status = ContractStatus::Active {
            reserved,
            remaining_secs: f64::from(self.spec.duration_months) * SECONDS_PER_MONTH,
        };
        Ok(())
    }

    /// Accrue income for `dt` seconds and age the contract
    ///
    /// The final update pays only for the time the contract was still
    /// running, then expires it.
    pub fn update(&mut self, dt: f64) -> ContractAccrual {
        let income_per_second = self.spec.monthly_income / SECONDS_PER_MONTH;
        let ContractStatus::Active { remaining_secs, .. } = &mut self.status else {
            return ContractAccrual::default();
        };

        let paid_secs = dt.min(*remaining_secs).max(0.0);
        *remaining_secs -= dt;
        let mut accrual = ContractAccrual {
            income: income_per_second * paid_secs,
            released: None,
        };

        if *remaining_secs <= 0.0 {
            let previous = std::mem::replace(&mut self.status, ContractStatus::Expired);
            if let ContractStatus::Active { reserved, .. } = previous {
                accrual.released = Some(reserved);
            }
        }
        accrual
    }
}

/// Pick `count` unreserved accelerators, highest reservation rank first
///
/// Ties keep purchase order. Returns `None` when too few are free.
pub fn select_reservation(
    fleet: &Fleet,
    reserved: &BTreeSet<AcceleratorId>,
    count: usize,
) -> Option<Vec<AcceleratorId>> {
    let mut candidates: Vec<_> = fleet
        .values()
        .filter(|a| !reserved.contains(&a.id()))
        .collect();
    if candidates.len() < count {
        return None;
    }
    candidates.sort_by_key(|a| std::cmp::Reverse(a.model().reservation_rank()));
    Some(candidates.into_iter().take(count).map(|a| a.id()).collect())
}

/// Contract expired during a manager update
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiredContract {
    pub id: String,
    pub released: Vec<AcceleratorId>,
}

/// All contracts, ordered by catalog priority
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractManager {
    contracts: Vec<Contract>,
}

impl ContractManager {
    /// One contract per catalog entry
    pub fn new(catalog: &Catalog) -> Self {
        let mut contracts: Vec<Contract> =
            catalog.contracts.iter().cloned().map(Contract::new).collect();
        contracts.sort_by_key(|c| c.spec.priority);
        Self { contracts }
    }

    pub fn get(&self, id: &str) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Contract, ContractError> {
        self.contracts
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or_else(|| ContractError::NotFound(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.iter()
    }

    pub fn active(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.iter().filter(|c| c.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// True iff there is at least one contract and every one is active
    pub fn all_active(&self) -> bool {
        !self.contracts.is_empty() && self.contracts.iter().all(Contract::is_active)
    }

    /// Union of reservations held by active contracts
    pub fn reserved_ids(&self) -> BTreeSet<AcceleratorId> {
        self.active()
            .flat_map(|c| c.reserved().iter().copied())
            .collect()
    }

    pub fn total_monthly_income(&self) -> f64 {
        self.active().map(|c| c.spec.monthly_income).sum()
    }

    /// Accrue income on every active contract; returns (income, expirations)
    pub fn update(&mut self, dt: f64) -> (f64, Vec<ExpiredContract>) {
        let mut income = 0.0;
        let mut expired = Vec::new();
        for contract in &mut self.contracts {
            let accrual = contract.update(dt);
            income += accrual.income;
            if let Some(released) = accrual.released {
                expired.push(ExpiredContract {
                    id: contract.id().to_string(),
                    released,
                });
            }
        }
        (income, expired)
    }
}
