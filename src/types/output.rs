//! Phase controller output

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{CueState, Phase, ReasonCode};

/// Result of every phase controller update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutput {
    pub timestamp: DateTime<Utc>,
    pub phase: Phase,
    pub cue: CueState,
    pub reason: ReasonCode,
}

impl PhaseOutput {
    pub fn new(phase: Phase, cue: CueState, reason: ReasonCode) -> Self {
        Self {
            timestamp: Utc::now(),
            phase,
            cue,
            reason,
        }
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "phase={} | cue={} | reason={}",
            self.phase,
            self.cue,
            self.reason.code()
        )
    }
}

/// Point-in-time view of an engine, for status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub phase: Phase,
    pub cue: CueState,
    pub recognizing: bool,
    pub processing: bool,
    pub last_committed: String,
    pub last_reason: ReasonCode,
    pub time_in_phase_ms: u64,
    /// Phase changes since the engine was created
    pub transitions: u64,
}
