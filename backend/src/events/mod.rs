//! Random demand spikes
//!
//! Types describe the spike catalogue; the handler decides when spikes start
//! and end.

pub mod handler;
pub mod types;

pub use handler::{SpikeMonitor, SpikeUpdate};
pub use types::{DemandSpike, SpikeKind};
