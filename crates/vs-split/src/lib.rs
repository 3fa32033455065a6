//! # vs-split
//!
//! Cutting a source video into fixed-length clips.
//!
//! This crate provides:
//!
//! - **[`plan`]** -- divide a duration into `ceil(duration / slice)` ordered
//!   segments.
//! - **[`SplitOrchestrator`]** -- run one lossless trim per segment against a
//!   [`MediaEngine`](vs_av::MediaEngine), strictly in order, collecting
//!   [`Artifact`]s.
//! - **[`SplitRun`] / [`RunStatus`]** -- the run state machine, with partial
//!   output held back until the run completes.
//! - **[`StatusSnapshot`]** -- a serialisable view for status observers.

pub mod artifact;
pub mod orchestrator;
pub mod planner;
pub mod request;
pub mod run;
pub mod status;

#[cfg(test)]
mod test_fixtures;

// Re-export key types at the crate root.
pub use artifact::{Artifact, ArtifactSummary};
pub use orchestrator::SplitOrchestrator;
pub use planner::{plan, SegmentDescriptor, SegmentPlan};
pub use request::{SourceVideo, SplitRequest};
pub use run::{RunStatus, SplitRun};
pub use status::StatusSnapshot;
