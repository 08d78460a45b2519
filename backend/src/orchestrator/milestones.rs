//! Achievements and victory conditions
//!
//! Both are pure predicates over a [`Progress`] summary built from the
//! simulation's aggregate totals at the end of a tick.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Completed jobs needed before lifetime SLA compliance counts for a badge
pub const SLA_CHAMPION_MIN_JOBS: u64 = 100;

/// Aggregate facts the milestone predicates read
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub accelerators: usize,
    pub total_revenue: f64,
    pub jobs_completed: u64,
    pub sla_misses: u64,
    /// Mean accelerator utilization in [0, 1]
    pub utilization: f64,
    pub pue: f64,
    pub active_contracts: usize,
    /// Every catalog contract is active at once
    pub all_contracts_active: bool,
}

impl Progress {
    /// Lifetime on-time ratio; `None` before any job has completed
    pub fn lifetime_compliance(&self) -> Option<f64> {
        if self.jobs_completed == 0 {
            None
        } else {
            Some(1.0 - self.sla_misses as f64 / self.jobs_completed as f64)
        }
    }
}

/// One-time badges
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    #[serde(rename = "gpu_10")]
    Gpu10,
    #[serde(rename = "gpu_50")]
    Gpu50,
    #[serde(rename = "gpu_100")]
    Gpu100,
    #[serde(rename = "revenue_100k")]
    Revenue100k,
    #[serde(rename = "revenue_500k")]
    Revenue500k,
    #[serde(rename = "revenue_1m")]
    Revenue1m,
    SlaChampion,
    EfficiencyExpert,
    GreenDatacenter,
    EnterprisePlayer,
}

impl Achievement {
    pub const ALL: [Achievement; 10] = [
        Achievement::Gpu10,
        Achievement::Gpu50,
        Achievement::Gpu100,
        Achievement::Revenue100k,
        Achievement::Revenue500k,
        Achievement::Revenue1m,
        Achievement::SlaChampion,
        Achievement::EfficiencyExpert,
        Achievement::GreenDatacenter,
        Achievement::EnterprisePlayer,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Achievement::Gpu10 => "gpu_10",
            Achievement::Gpu50 => "gpu_50",
            Achievement::Gpu100 => "gpu_100",
            Achievement::Revenue100k => "revenue_100k",
            Achievement::Revenue500k => "revenue_500k",
            Achievement::Revenue1m => "revenue_1m",
            Achievement::SlaChampion => "sla_champion",
            Achievement::EfficiencyExpert => "efficiency_expert",
            Achievement::GreenDatacenter => "green_datacenter",
            Achievement::EnterprisePlayer => "enterprise_player",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Achievement::Gpu10 => "Small Cluster",
            Achievement::Gpu50 => "Medium Datacenter",
            Achievement::Gpu100 => "Large Scale Infrastructure",
            Achievement::Revenue100k => "First $100K",
            Achievement::Revenue500k => "Half Million",
            Achievement::Revenue1m => "Millionaire",
            Achievement::SlaChampion => "SLA Champion",
            Achievement::EfficiencyExpert => "Efficiency Expert",
            Achievement::GreenDatacenter => "Green Datacenter",
            Achievement::EnterprisePlayer => "Enterprise Player",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::Gpu10 => "Own 10 GPUs",
            Achievement::Gpu50 => "Own 50 GPUs",
            Achievement::Gpu100 => "Own 100 GPUs",
            Achievement::Revenue100k => "Earn $100,000 total revenue",
            Achievement::Revenue500k => "Earn $500,000 total revenue",
            Achievement::Revenue1m => "Earn $1,000,000 total revenue",
            Achievement::SlaChampion => "95%+ SLA compliance over 100 jobs",
            Achievement::EfficiencyExpert => "85%+ utilization with 20+ GPUs",
            Achievement::GreenDatacenter => "Achieve PUE of 1.25 or lower",
            Achievement::EnterprisePlayer => "Have 2+ active contracts",
        }
    }

    pub fn is_met(self, p: &Progress) -> bool {
        match self {
            Achievement::Gpu10 => p.accelerators >= 10,
            Achievement::Gpu50 => p.accelerators >= 50,
            Achievement::Gpu100 => p.accelerators >= 100,
            Achievement::Revenue100k => p.total_revenue >= 100_000.0,
            Achievement::Revenue500k => p.total_revenue >= 500_000.0,
            Achievement::Revenue1m => p.total_revenue >= 1_000_000.0,
            Achievement::SlaChampion => {
                p.jobs_completed >= SLA_CHAMPION_MIN_JOBS
                    && p.lifetime_compliance().is_some_and(|c| c >= 0.95)
            }
            Achievement::EfficiencyExpert => p.accelerators >= 20 && p.utilization >= 0.85,
            Achievement::GreenDatacenter => p.accelerators > 0 && p.pue <= 1.25,
            Achievement::EnterprisePlayer => p.active_contracts >= 2,
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Game-ending conditions, checked in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Victory {
    RevenueTycoon,
    DatacenterMogul,
    EnterpriseKing,
    EfficiencyMaster,
}

impl Victory {
    pub const ALL: [Victory; 4] = [
        Victory::RevenueTycoon,
        Victory::DatacenterMogul,
        Victory::EnterpriseKing,
        Victory::EfficiencyMaster,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Victory::RevenueTycoon => "Revenue Tycoon",
            Victory::DatacenterMogul => "Datacenter Mogul",
            Victory::EnterpriseKing => "Enterprise King",
            Victory::EfficiencyMaster => "Efficiency Master",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Victory::RevenueTycoon => "Reached $5,000,000 total revenue!",
            Victory::DatacenterMogul => "Built a 200+ GPU datacenter!",
            Victory::EnterpriseKing => "All major contracts active simultaneously!",
            Victory::EfficiencyMaster => "90%+ SLA, 80%+ utilization, PUE <= 1.25 with 50+ GPUs!",
        }
    }

    pub fn is_met(self, p: &Progress) -> bool {
        match self {
            Victory::RevenueTycoon => p.total_revenue >= 5_000_000.0,
            Victory::DatacenterMogul => p.accelerators >= 200,
            Victory::EnterpriseKing => p.all_contracts_active,
            Victory::EfficiencyMaster => {
                p.accelerators >= 50
                    && p.jobs_completed >= 200
                    && p.lifetime_compliance().is_some_and(|c| c >= 0.90)
                    && p.utilization >= 0.80
                    && p.pue <= 1.25
            }
        }
    }

    /// First satisfied condition, if any
    pub fn evaluate(p: &Progress) -> Option<Victory> {
        Victory::ALL.into_iter().find(|v| v.is_met(p))
    }
}

impl fmt::Display for Victory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Achievements satisfied by `p` that are not already in `unlocked`
pub fn newly_unlocked<'a>(
    p: &'a Progress,
    unlocked: &'a std::collections::BTreeSet<Achievement>,
) -> impl Iterator<Item = Achievement> + 'a {
    Achievement::ALL
        .into_iter()
        .filter(move |a| !unlocked.contains(a) && a.is_met(p))
}
