//! Orchestrator - simulation root
//!
//! [`Simulation`] owns the game state and runs the tick loop; see
//! `engine.rs`. Configuration, milestone predicates and the read-only
//! snapshot live in their own modules.

pub mod config;
pub mod engine;
pub mod milestones;
pub mod snapshot;

pub use config::{SimulationConfig, DEFAULT_SLA_HISTORY_WINDOW};
pub use engine::{ActionError, ActionOutcome, Simulation, SimulationError, TickResult};
pub use milestones::{Achievement, Progress, Victory};
pub use snapshot::{compute_digest, Coordination, Snapshot};
