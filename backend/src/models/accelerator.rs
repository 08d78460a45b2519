//! Accelerator (GPU) model
//!
//! A purchased unit of compute. Capacity attributes are copied from the
//! catalog spec at purchase time and never change; runtime state tracks the
//! single job slot, allocated VRAM and utilization.
//!
//! Accelerators are never destroyed. Jobs and clusters refer to them by id.

use crate::catalog::{AcceleratorSpec, CoolingTier, GpuModel};
use crate::models::job::JobId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accelerator identifier (assigned in purchase order, starting at 1)
pub type AcceleratorId = u32;

/// Owned accelerators keyed by id; iteration order is purchase order
pub type Fleet = BTreeMap<AcceleratorId, Accelerator>;

/// A single accelerator with one job slot
///
/// # Example
/// ```
/// use gpu_tycoon_core::catalog::{Catalog, GpuModel};
/// use gpu_tycoon_core::Accelerator;
///
/// let catalog = Catalog::standard();
/// let mut gpu = Accelerator::new(1, catalog.accelerator(GpuModel::L4).unwrap());
/// assert!(gpu.is_available());
///
/// gpu.assign(7, 16);
/// assert_eq!(gpu.current_job(), Some(7));
/// assert_eq!(gpu.vram_used(), 16);
///
/// gpu.release();
/// assert!(gpu.is_available());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accelerator {
    id: AcceleratorId,
    model: GpuModel,
    name: String,
    vram_gb: u32,
    power_watts: f64,
    performance: f64,
    cooling: CoolingTier,

    /// Job occupying this accelerator (shared by all members of a placement)
    current_job: Option<JobId>,

    /// VRAM allocated to the current job (GB)
    vram_used: u32,

    /// Fraction of the accelerator in use, [0, 1]
    utilization: f64,
}

impl Accelerator {
    /// Build a fresh, idle accelerator from its catalog spec
    pub fn new(id: AcceleratorId, spec: &AcceleratorSpec) -> Self {
        Self {
            id,
            model: spec.model,
            name: spec.name.clone(),
            vram_gb: spec.vram_gb,
            power_watts: spec.power_watts,
            performance: spec.performance,
            cooling: spec.cooling,
            current_job: None,
            vram_used: 0,
            utilization: 0.0,
        }
    }

    /// True iff no job occupies the slot
    pub fn is_available(&self) -> bool {
        self.current_job.is_none()
    }

    /// Occupy the slot with `job`, allocating `vram` GB
    ///
    /// Individual placements pass the job's per-unit requirement; pooled
    /// cluster placements pass this member's share, which may be zero.
    /// Callers have already checked availability.
    pub fn assign(&mut self, job: JobId, vram: u32) {
        self.current_job = Some(job);
        self.vram_used = vram;
        self.utilization = 1.0;
    }

    /// Clear the slot
    pub fn release(&mut self) {
        self.current_job = None;
        self.vram_used = 0;
        self.utilization = 0.0;
    }

    pub fn id(&self) -> AcceleratorId {
        self.id
    }

    pub fn model(&self) -> GpuModel {
        self.model
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vram_gb(&self) -> u32 {
        self.vram_gb
    }

    pub fn power_watts(&self) -> f64 {
        self.power_watts
    }

    pub fn performance(&self) -> f64 {
        self.performance
    }

    pub fn cooling(&self) -> CoolingTier {
        self.cooling
    }

    pub fn current_job(&self) -> Option<JobId> {
        self.current_job
    }

    pub fn vram_used(&self) -> u32 {
        self.vram_used
    }

    pub fn utilization(&self) -> f64 {
        self.utilization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn h100(id: AcceleratorId) -> Accelerator {
        Accelerator::new(id, Catalog::standard().accelerator(GpuModel::H100).unwrap())
    }

    #[test]
    fn test_new_accelerator_copies_spec() {
        let gpu = h100(3);
        assert_eq!(gpu.id(), 3);
        assert_eq!(gpu.model(), GpuModel::H100);
        assert_eq!(gpu.vram_gb(), 80);
        assert_eq!(gpu.performance(), 10.0);
        assert_eq!(gpu.cooling(), CoolingTier::Liquid);
        assert_eq!(gpu.utilization(), 0.0);
    }

    #[test]
    fn test_assign_with_zero_share_still_occupies_slot() {
        let mut gpu = h100(1);
        gpu.assign(42, 0);
        assert!(!gpu.is_available());
        assert_eq!(gpu.vram_used(), 0);
        assert_eq!(gpu.utilization(), 1.0);
    }

    #[test]
    fn test_release_clears_everything() {
        let mut gpu = h100(1);
        gpu.assign(42, 50);
        gpu.release();
        assert_eq!(gpu.current_job(), None);
        assert_eq!(gpu.vram_used(), 0);
        assert_eq!(gpu.utilization(), 0.0);
    }
}
