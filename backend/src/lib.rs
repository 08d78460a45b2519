//! GPU Tycoon Core - datacenter simulation engine
//!
//! Deterministic simulation of a GPU datacenter: customers submit jobs, the
//! scheduler places them on accelerators (individually or on pooled
//! clusters), and the operator grows the fleet with the proceeds.
//!
//! # Architecture
//!
//! - **core**: Simulated clock
//! - **rng**: Deterministic random number generation
//! - **catalog**: Static accelerator, contract and marketing tables
//! - **models**: Domain types (Accelerator, Job, Cluster, Contract, State)
//! - **economy**: Derived cooling, PUE, networking and power cost
//! - **arrivals**: Job generation and backpressure
//! - **events**: Demand spikes
//! - **scheduler**: EDF ordering and cluster-aware placement
//! - **orchestrator**: Tick loop, player actions, milestones, snapshots
//!
//! # Critical Invariants
//!
//! 1. An accelerator runs at most one job at a time
//! 2. An accelerator belongs to at most one cluster; clusters are single-model
//! 3. A job is placed completely or not at all
//! 4. All randomness is deterministic (seeded RNG) and time only moves via `tick`

pub mod arrivals;
pub mod catalog;
pub mod core;
pub mod economy;
pub mod events;
pub mod models;
pub mod orchestrator;
pub mod rng;
pub mod scheduler;

// Re-exports for convenience
pub use catalog::{Catalog, CatalogError, GpuModel};
pub use core::time::SimClock;
pub use models::{
    accelerator::{Accelerator, AcceleratorId, Fleet},
    cluster::{Cluster, ClusterError, ClusterId, ClusterManager},
    contract::{Contract, ContractError, ContractStatus},
    event::{Event, EventLog},
    job::{Job, JobError, JobId, JobRequest, JobState},
    state::SimulationState,
};
pub use orchestrator::{
    ActionError, ActionOutcome, Simulation, SimulationConfig, SimulationError, Snapshot,
    TickResult,
};
pub use rng::RngManager;
pub use scheduler::{AssignError, PlacementPlan};
