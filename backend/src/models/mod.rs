//! Domain models for the datacenter simulation

pub mod accelerator;
pub mod cluster;
pub mod contract;
pub mod event;
pub mod job;
pub mod marketing;
pub mod state;

// Re-exports
pub use accelerator::{Accelerator, AcceleratorId, Fleet};
pub use cluster::{Cluster, ClusterError, ClusterId, ClusterManager};
pub use contract::{Contract, ContractError, ContractManager, ContractStatus, FleetProfile};
pub use event::{Event, EventLog};
pub use job::{Job, JobError, JobId, JobKind, JobRequest, JobSize, JobState};
pub use marketing::{MarketingError, MarketingManager};
pub use state::SimulationState;
