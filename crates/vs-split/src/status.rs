//! Polled view of a split run for status observers.

use serde::{Deserialize, Serialize};
use vs_core::RunId;

use crate::artifact::ArtifactSummary;
use crate::run::{RunStatus, SplitRun};

/// Point-in-time copy of a run's observable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub run_id: Option<RunId>,
    pub status: RunStatus,
    /// Human-readable status line (`Processing`, `Error: <cause>`, ...).
    pub message: String,
    /// Progress of the in-flight invocation, 0--100. Restarts at 0 for every
    /// segment.
    pub progress_percent: u8,
    pub completed_segments: usize,
    pub total_segments: usize,
    /// Empty unless the run completed.
    pub artifacts: Vec<ArtifactSummary>,
}

impl From<&SplitRun> for StatusSnapshot {
    fn from(run: &SplitRun) -> Self {
        Self {
            run_id: run.run_id(),
            status: run.status().clone(),
            message: run.status().to_string(),
            progress_percent: run.progress_percent(),
            completed_segments: run.completed_segments(),
            total_segments: run.total_segments(),
            artifacts: run.artifacts().iter().map(|a| a.summary()).collect(),
        }
    }
}
