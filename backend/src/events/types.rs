//! Demand spike types
//!
//! A spike temporarily multiplies how often jobs arrive and how much they
//! pay. Spikes are drawn at random by the [`SpikeMonitor`](super::SpikeMonitor)
//! and expire on their own.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of demand spike that can occur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpikeKind {
    ChatGptLaunch,
    TrainingRush,
    ConferenceDemoSeason,
    ViralAiApp,
}

impl SpikeKind {
    pub const ALL: [SpikeKind; 4] = [
        SpikeKind::ChatGptLaunch,
        SpikeKind::TrainingRush,
        SpikeKind::ConferenceDemoSeason,
        SpikeKind::ViralAiApp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpikeKind::ChatGptLaunch => "ChatGPT Launch Spike",
            SpikeKind::TrainingRush => "Training Rush",
            SpikeKind::ConferenceDemoSeason => "Conference Demo Season",
            SpikeKind::ViralAiApp => "Viral AI App",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SpikeKind::ChatGptLaunch => {
                "A major lab just launched a new model! Inference demand surging!"
            }
            SpikeKind::TrainingRush => "Major AI lab needs emergency compute for deadline!",
            SpikeKind::ConferenceDemoSeason => {
                "NeurIPS demos this week - everyone needs inference!"
            }
            SpikeKind::ViralAiApp => "A new AI app went viral! Burst capacity needed!",
        }
    }

    pub fn spawn_multiplier(self) -> f64 {
        match self {
            SpikeKind::ChatGptLaunch => 3.0,
            SpikeKind::TrainingRush => 2.0,
            SpikeKind::ConferenceDemoSeason => 2.5,
            SpikeKind::ViralAiApp => 4.0,
        }
    }

    pub fn value_multiplier(self) -> f64 {
        match self {
            SpikeKind::ChatGptLaunch => 1.5,
            SpikeKind::TrainingRush => 2.0,
            SpikeKind::ConferenceDemoSeason => 1.3,
            SpikeKind::ViralAiApp => 1.2,
        }
    }

    /// Lifetime of the spike in simulated seconds
    pub fn duration(self) -> f64 {
        match self {
            SpikeKind::ChatGptLaunch => 30.0,
            SpikeKind::TrainingRush => 45.0,
            SpikeKind::ConferenceDemoSeason => 60.0,
            SpikeKind::ViralAiApp => 20.0,
        }
    }
}

impl fmt::Display for SpikeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A running demand spike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSpike {
    pub kind: SpikeKind,
    pub time_remaining: f64,
}

impl DemandSpike {
    pub fn new(kind: SpikeKind) -> Self {
        Self {
            kind,
            time_remaining: kind.duration(),
        }
    }

    pub fn spawn_multiplier(&self) -> f64 {
        self.kind.spawn_multiplier()
    }

    pub fn value_multiplier(&self) -> f64 {
        self.kind.value_multiplier()
    }

    pub fn is_expired(&self) -> bool {
        self.time_remaining <= 0.0
    }
}
