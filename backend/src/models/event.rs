//! Event logging for simulation observability.
//!
//! The simulation records every significant state change as an [`Event`].
//! Events let callers see what happened during a tick without diffing
//! snapshots:
//! - **Arrivals**: jobs generated (or suppressed by backpressure)
//! - **Scheduling**: placements, sync checkpoints, completions
//! - **Economy**: purchases, marketing upgrades
//! - **Infrastructure**: cluster changes, contract transitions
//! - **Progress**: demand spikes, achievements, victory
//!
//! The log is a bounded ring: once full, the oldest event is dropped.
//!
//! # Example
//!
//! ```rust
//! use gpu_tycoon_core::models::{Event, EventLog};
//!
//! let mut log = EventLog::with_capacity(2);
//! log.log(Event::AutoAssignToggled { time: 1.0, enabled: false });
//! log.log(Event::AutoAssignToggled { time: 2.0, enabled: true });
//! log.log(Event::AutoAssignToggled { time: 3.0, enabled: false });
//!
//! assert_eq!(log.len(), 2);
//! assert_eq!(log.total_logged(), 3);
//! assert_eq!(log.events().next().unwrap().time(), 2.0);
//! ```

use crate::catalog::GpuModel;
use crate::models::accelerator::AcceleratorId;
use crate::models::cluster::ClusterId;
use crate::models::job::JobId;
use crate::orchestrator::milestones::{Achievement, Victory};
use serde::Serialize;
use std::collections::VecDeque;

/// Default number of events retained
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 500;

/// Simulation event capturing a state change.
///
/// Every event carries the simulated time it occurred at.
/// Events are logged in the order they occur within a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// New job appended to the pending queue
    JobArrival {
        time: f64,
        job_id: JobId,
        customer: String,
        gpu_count: usize,
        vram_per_gpu: u32,
        payout: f64,
        sla_deadline: f64,
    },

    /// Generation tick skipped because the backlog hit its hard limit
    ArrivalSuppressed {
        time: f64,
        backlog: usize,
        limit: usize,
    },

    /// Job placed on accelerators (or a whole cluster)
    JobStarted {
        time: f64,
        job_id: JobId,
        accelerators: Vec<AcceleratorId>,
        cluster_id: Option<ClusterId>,
        duration: f64,
        network_penalty: f64,
    },

    /// Multi-accelerator job crossed a synchronization checkpoint
    JobSync {
        time: f64,
        job_id: JobId,
        checkpoint: f64,
    },

    /// Job finished and was paid
    JobCompleted {
        time: f64,
        job_id: JobId,
        payout: f64,
        sla_missed: bool,
    },

    AcceleratorPurchased {
        time: f64,
        accelerator_id: AcceleratorId,
        model: GpuModel,
        cost: f64,
    },

    AutoAssignToggled {
        time: f64,
        enabled: bool,
    },

    ClusterCreated {
        time: f64,
        cluster_id: ClusterId,
        members: Vec<AcceleratorId>,
    },

    ClusterMemberAdded {
        time: f64,
        cluster_id: ClusterId,
        accelerator_id: AcceleratorId,
    },

    ClusterMemberRemoved {
        time: f64,
        cluster_id: ClusterId,
        accelerator_id: AcceleratorId,
        /// The removal emptied and deleted the cluster
        cluster_deleted: bool,
    },

    ClusterDisbanded {
        time: f64,
        cluster_id: ClusterId,
    },

    ContractNegotiationStarted {
        time: f64,
        contract_id: String,
    },

    ContractInvestment {
        time: f64,
        contract_id: String,
        amount: f64,
        progress: f64,
    },

    ContractActivated {
        time: f64,
        contract_id: String,
        reserved: Vec<AcceleratorId>,
    },

    ContractExpired {
        time: f64,
        contract_id: String,
        released: Vec<AcceleratorId>,
    },

    MarketingUpgraded {
        time: f64,
        level: u32,
        name: String,
        cost: f64,
    },

    SpikeStarted {
        time: f64,
        name: String,
        duration: f64,
    },

    SpikeEnded {
        time: f64,
        name: String,
    },

    AchievementUnlocked {
        time: f64,
        achievement: Achievement,
    },

    VictoryAchieved {
        time: f64,
        victory: Victory,
    },
}

impl Event {
    /// Simulated time the event occurred at
    pub fn time(&self) -> f64 {
        match self {
            Event::JobArrival { time, .. }
            | Event::ArrivalSuppressed { time, .. }
            | Event::JobStarted { time, .. }
            | Event::JobSync { time, .. }
            | Event::JobCompleted { time, .. }
            | Event::AcceleratorPurchased { time, .. }
            | Event::AutoAssignToggled { time, .. }
            | Event::ClusterCreated { time, .. }
            | Event::ClusterMemberAdded { time, .. }
            | Event::ClusterMemberRemoved { time, .. }
            | Event::ClusterDisbanded { time, .. }
            | Event::ContractNegotiationStarted { time, .. }
            | Event::ContractInvestment { time, .. }
            | Event::ContractActivated { time, .. }
            | Event::ContractExpired { time, .. }
            | Event::MarketingUpgraded { time, .. }
            | Event::SpikeStarted { time, .. }
            | Event::SpikeEnded { time, .. }
            | Event::AchievementUnlocked { time, .. }
            | Event::VictoryAchieved { time, .. } => *time,
        }
    }

    /// Short name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::JobArrival { .. } => "JobArrival",
            Event::ArrivalSuppressed { .. } => "ArrivalSuppressed",
            Event::JobStarted { .. } => "JobStarted",
            Event::JobSync { .. } => "JobSync",
            Event::JobCompleted { .. } => "JobCompleted",
            Event::AcceleratorPurchased { .. } => "AcceleratorPurchased",
            Event::AutoAssignToggled { .. } => "AutoAssignToggled",
            Event::ClusterCreated { .. } => "ClusterCreated",
            Event::ClusterMemberAdded { .. } => "ClusterMemberAdded",
            Event::ClusterMemberRemoved { .. } => "ClusterMemberRemoved",
            Event::ClusterDisbanded { .. } => "ClusterDisbanded",
            Event::ContractNegotiationStarted { .. } => "ContractNegotiationStarted",
            Event::ContractInvestment { .. } => "ContractInvestment",
            Event::ContractActivated { .. } => "ContractActivated",
            Event::ContractExpired { .. } => "ContractExpired",
            Event::MarketingUpgraded { .. } => "MarketingUpgraded",
            Event::SpikeStarted { .. } => "SpikeStarted",
            Event::SpikeEnded { .. } => "SpikeEnded",
            Event::AchievementUnlocked { .. } => "AchievementUnlocked",
            Event::VictoryAchieved { .. } => "VictoryAchieved",
        }
    }

    /// Job id if the event relates to a specific job
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            Event::JobArrival { job_id, .. }
            | Event::JobStarted { job_id, .. }
            | Event::JobSync { job_id, .. }
            | Event::JobCompleted { job_id, .. } => Some(*job_id),
            _ => None,
        }
    }
}

/// Bounded event log.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<Event>,
    capacity: usize,
    total_logged: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_LOG_CAPACITY)
    }
}

impl EventLog {
    /// Create an empty log retaining at most `capacity` events (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            total_logged: 0,
        }
    }

    /// Add an event, evicting the oldest one if full
    pub fn log(&mut self, event: Event) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.total_logged += 1;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events ever logged, including evicted ones
    pub fn total_logged(&self) -> u64 {
        self.total_logged
    }

    /// Retained events, oldest first
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// The most recent `n` events, oldest first
    pub fn recent(&self, n: usize) -> Vec<&Event> {
        let skip = self.events.len().saturating_sub(n);
        self.events.iter().skip(skip).collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_job(&self, job_id: JobId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.job_id() == Some(job_id))
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
