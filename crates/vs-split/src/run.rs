//! Run state machine.
//!
//! ```text
//! Idle ──> Starting ──> Processing ──> Complete
//!   ^         │             ├────────> Error(message)
//!   │         └─────────────┴────────> Cancelled
//!   └── Complete / Error / Cancelled ──> Starting (reset)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use vs_core::{Error, Result, RunId};

use crate::artifact::Artifact;

/// Status of the current (or last) split run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Idle,
    Starting,
    Processing,
    Complete,
    Error(String),
    Cancelled,
}

impl RunStatus {
    /// Short lowercase name of the state.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Error(_) => "error",
            Self::Cancelled => "cancelled",
        }
    }

    /// A run is underway.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::Processing)
    }

    fn can_transition_to(&self, next: &RunStatus) -> bool {
        use RunStatus::*;
        matches!(
            (self, next),
            (Idle | Complete | Error(_) | Cancelled, Starting)
                | (Starting, Processing)
                | (Processing, Complete)
                | (Starting | Processing, Error(_))
                | (Starting | Processing, Cancelled)
        )
    }
}

/// Human-readable status line: the state name, or `Error: <cause>`.
impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Starting => write!(f, "Starting"),
            Self::Processing => write!(f, "Processing"),
            Self::Complete => write!(f, "Complete"),
            Self::Error(message) => write!(f, "Error: {message}"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Mutable state of one split run.
///
/// Artifacts collected while processing are held back and only become
/// visible once the run reaches [`RunStatus::Complete`]; a failed or
/// cancelled run exposes none.
#[derive(Debug, Default)]
pub struct SplitRun {
    run_id: Option<RunId>,
    status: RunStatus,
    total_segments: usize,
    completed_segments: usize,
    progress_percent: u8,
    artifacts: Vec<Artifact>,
}

impl SplitRun {
    pub fn run_id(&self) -> Option<RunId> {
        self.run_id
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn total_segments(&self) -> usize {
        self.total_segments
    }

    pub fn completed_segments(&self) -> usize {
        self.completed_segments
    }

    /// Progress of the in-flight invocation, 0--100.
    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    /// Produced segments, in plan order. Empty unless the run completed.
    pub fn artifacts(&self) -> &[Artifact] {
        match self.status {
            RunStatus::Complete => &self.artifacts,
            _ => &[],
        }
    }

    fn transition(&mut self, next: RunStatus) -> Result<()> {
        if !self.status.can_transition_to(&next) {
            return Err(Error::Internal(format!(
                "invalid run transition {} -> {}",
                self.status.label(),
                next.label()
            )));
        }
        self.status = next;
        Ok(())
    }

    /// `-> Starting`: forget everything from the previous run.
    pub fn begin(&mut self, run_id: RunId, total_segments: usize) -> Result<()> {
        self.transition(RunStatus::Starting)?;
        self.run_id = Some(run_id);
        self.total_segments = total_segments;
        self.completed_segments = 0;
        self.progress_percent = 0;
        self.artifacts.clear();
        Ok(())
    }

    /// `Starting -> Processing`, once the source is staged.
    pub fn mark_processing(&mut self) -> Result<()> {
        self.transition(RunStatus::Processing)
    }

    /// A new invocation is about to start; its progress begins at 0.
    pub fn start_segment(&mut self) {
        self.progress_percent = 0;
    }

    /// Record progress of the in-flight invocation. Returns `true` when the
    /// value changed.
    pub fn set_progress(&mut self, percent: u8) -> bool {
        let percent = percent.min(100);
        if self.status != RunStatus::Processing || percent == self.progress_percent {
            return false;
        }
        self.progress_percent = percent;
        true
    }

    /// Append a finished segment.
    pub fn push_artifact(&mut self, artifact: Artifact) -> Result<()> {
        if self.status != RunStatus::Processing {
            return Err(Error::Internal(format!(
                "segment finished while run is {}",
                self.status.label()
            )));
        }
        self.artifacts.push(artifact);
        self.completed_segments += 1;
        Ok(())
    }

    /// `Processing -> Complete`.
    pub fn complete(&mut self) -> Result<()> {
        self.transition(RunStatus::Complete)
    }

    /// `-> Error`, dropping any partial output.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(RunStatus::Error(message.into()))?;
        self.artifacts.clear();
        Ok(())
    }

    /// `-> Cancelled`, dropping any partial output.
    pub fn cancel(&mut self) -> Result<()> {
        self.transition(RunStatus::Cancelled)?;
        self.artifacts.clear();
        Ok(())
    }
}
