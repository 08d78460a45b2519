//! Static catalog tables
//!
//! Accelerator models, enterprise contracts and marketing tiers. The tables
//! are loaded once (either [`Catalog::standard`] or a JSON file through
//! [`Catalog::from_json`]), validated, and then shared read-only behind an
//! `Arc` by every component that needs them.

mod tables;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Seconds in a contract month (30 days)
pub const SECONDS_PER_MONTH: f64 = 30.0 * 24.0 * 3600.0;

/// Accelerator tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GpuModel {
    L4,
    A100,
    H100,
    GB200,
}

impl GpuModel {
    /// Every model, cheapest first
    pub const ALL: [GpuModel; 4] = [GpuModel::L4, GpuModel::A100, GpuModel::H100, GpuModel::GB200];

    /// NVLink-class parts get an interconnect bonus on matched multi-unit jobs
    pub fn has_nvlink(self) -> bool {
        matches!(self, GpuModel::H100 | GpuModel::GB200)
    }

    /// Counts toward a contract's "H100 or better" requirement
    pub fn is_h100_class(self) -> bool {
        matches!(self, GpuModel::H100 | GpuModel::GB200)
    }

    /// Preference when a contract picks accelerators to reserve (higher first)
    pub fn reservation_rank(self) -> u8 {
        match self {
            GpuModel::GB200 => 5,
            GpuModel::H100 => 2,
            GpuModel::A100 => 1,
            GpuModel::L4 => 0,
        }
    }
}

impl fmt::Display for GpuModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GpuModel::L4 => "L4",
            GpuModel::A100 => "A100",
            GpuModel::H100 => "H100",
            GpuModel::GB200 => "GB200",
        };
        f.write_str(name)
    }
}

/// Facility cooling tier, ordered from least to most capable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoolingTier {
    Air,
    Liquid,
    AdvancedLiquid,
}

impl CoolingTier {
    /// Power usage effectiveness of a facility built on this tier
    pub fn pue(self) -> f64 {
        match self {
            CoolingTier::Air => 1.45,
            CoolingTier::Liquid => 1.28,
            CoolingTier::AdvancedLiquid => 1.22,
        }
    }
}

impl fmt::Display for CoolingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoolingTier::Air => "air",
            CoolingTier::Liquid => "liquid",
            CoolingTier::AdvancedLiquid => "advanced_liquid",
        };
        f.write_str(name)
    }
}

/// Interconnect tier a contract may demand
///
/// Networking upgrades itself with fleet size, so a tier is expressed as a
/// minimum accelerator count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkTier {
    Infiniband,
    NvlinkFabric,
}

impl NetworkTier {
    pub fn min_fleet_size(self) -> usize {
        match self {
            NetworkTier::Infiniband => 13,
            NetworkTier::NvlinkFabric => 25,
        }
    }
}

impl fmt::Display for NetworkTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkTier::Infiniband => f.write_str("infiniband"),
            NetworkTier::NvlinkFabric => f.write_str("nvlink_fabric"),
        }
    }
}

/// Fixed attributes of an accelerator model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorSpec {
    pub model: GpuModel,
    pub name: String,
    pub vram_gb: u32,
    pub power_watts: f64,
    /// Throughput relative to the base tier (L4 = 1.0)
    pub performance: f64,
    pub cost: f64,
    /// Lifetime revenue needed before the model can be bought
    pub unlock_revenue: f64,
    pub cooling: CoolingTier,
}

/// Enterprise contract terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSpec {
    pub id: String,
    pub customer: String,
    pub title: String,
    pub min_gpus: usize,
    #[serde(default)]
    pub min_h100s: usize,
    #[serde(default)]
    pub network: Option<NetworkTier>,
    #[serde(default)]
    pub cooling: Option<CoolingTier>,
    pub min_revenue: f64,
    pub reserves_gpus: usize,
    pub monthly_income: f64,
    pub negotiation_cost_total: f64,
    pub duration_months: u32,
    pub priority: u32,
}

/// One rung of the marketing ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingTier {
    pub level: u32,
    pub name: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub unlock_revenue: f64,
    pub spawn_multiplier: f64,
    pub value_multiplier: f64,
    /// Extra seconds added to every new job's SLA window
    #[serde(default)]
    pub sla_extension: f64,
}

/// Catalog validation errors
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("Catalog JSON is invalid: {0}")]
    Parse(String),

    #[error("Catalog has no accelerator models")]
    NoAccelerators,

    #[error("Catalog has no marketing tiers")]
    NoMarketingTiers,

    #[error("Duplicate catalog entry: {0}")]
    Duplicate(String),

    #[error("Accelerator {model} has invalid {field}")]
    InvalidAccelerator { model: GpuModel, field: &'static str },

    #[error("Contract {0} reserves no accelerators or has no negotiation cost")]
    InvalidContract(String),

    #[error("Marketing tiers must start at a free level 0 and increase by one")]
    InvalidMarketingLadder,
}

/// All static tables the simulation reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub accelerators: Vec<AcceleratorSpec>,
    pub contracts: Vec<ContractSpec>,
    pub marketing: Vec<MarketingTier>,
}

impl Catalog {
    /// The shipped game tables
    ///
    /// # Example
    /// ```
    /// use gpu_tycoon_core::catalog::{Catalog, GpuModel};
    ///
    /// let catalog = Catalog::standard();
    /// assert!(catalog.validate().is_ok());
    /// assert_eq!(catalog.accelerator(GpuModel::L4).unwrap().cost, 3000.0);
    /// ```
    pub fn standard() -> Self {
        Self {
            accelerators: tables::accelerators(),
            contracts: tables::contracts(),
            marketing: tables::marketing_tiers(),
        }
    }

    /// Parse and validate a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check table consistency
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.accelerators.is_empty() {
            return Err(CatalogError::NoAccelerators);
        }
        if self.marketing.is_empty() {
            return Err(CatalogError::NoMarketingTiers);
        }

        let mut models = HashSet::new();
        for spec in &self.accelerators {
            if !models.insert(spec.model) {
                return Err(CatalogError::Duplicate(spec.model.to_string()));
            }
            if spec.vram_gb == 0 {
                return Err(CatalogError::InvalidAccelerator {
                    model: spec.model,
                    field: "vram_gb",
                });
            }
            if !(spec.performance > 0.0) {
                return Err(CatalogError::InvalidAccelerator {
                    model: spec.model,
                    field: "performance",
                });
            }
        }

        let mut contract_ids = HashSet::new();
        for contract in &self.contracts {
            if !contract_ids.insert(contract.id.as_str()) {
                return Err(CatalogError::Duplicate(contract.id.clone()));
            }
            if contract.reserves_gpus == 0 || !(contract.negotiation_cost_total > 0.0) {
                return Err(CatalogError::InvalidContract(contract.id.clone()));
            }
        }

        let ladder_ok = self
            .marketing
            .iter()
            .enumerate()
            .all(|(i, tier)| tier.level as usize == i)
            && self.marketing[0].cost == 0.0;
        if !ladder_ok {
            return Err(CatalogError::InvalidMarketingLadder);
        }

        Ok(())
    }

    pub fn accelerator(&self, model: GpuModel) -> Option<&AcceleratorSpec> {
        self.accelerators.iter().find(|spec| spec.model == model)
    }

    pub fn contract(&self, id: &str) -> Option<&ContractSpec> {
        self.contracts.iter().find(|spec| spec.id == id)
    }

    pub fn marketing_tier(&self, level: u32) -> Option<&MarketingTier> {
        self.marketing.get(level as usize)
    }

    pub fn max_marketing_level(&self) -> u32 {
        self.marketing.len().saturating_sub(1) as u32
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.validate(), Ok(()));
        assert_eq!(catalog.accelerators.len(), 4);
        assert_eq!(catalog.contracts.len(), 4);
        assert_eq!(catalog.max_marketing_level(), 15);
    }

    #[test]
    fn test_json_round_trip_of_standard_catalog() {
        let json = serde_json::to_string(&Catalog::standard()).unwrap();
        let parsed = Catalog::from_json(&json).unwrap();
        assert_eq!(parsed, Catalog::standard());
    }

    #[test]
    fn test_duplicate_model_rejected() {
        let mut catalog = Catalog::standard();
        let dup = catalog.accelerators[0].clone();
        catalog.accelerators.push(dup);
        assert_eq!(
            catalog.validate(),
            Err(CatalogError::Duplicate("L4".to_string()))
        );
    }

    #[test]
    fn test_marketing_ladder_must_start_free() {
        let mut catalog = Catalog::standard();
        catalog.marketing[0].cost = 10.0;
        assert_eq!(catalog.validate(), Err(CatalogError::InvalidMarketingLadder));
    }

    #[test]
    fn test_garbage_json_is_parse_error() {
        assert!(matches!(
            Catalog::from_json("{not json"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_cooling_tiers_are_ordered() {
        assert!(CoolingTier::Air < CoolingTier::Liquid);
        assert!(CoolingTier::Liquid < CoolingTier::AdvancedLiquid);
        assert!(CoolingTier::AdvancedLiquid.pue() < CoolingTier::Air.pue());
    }
}
