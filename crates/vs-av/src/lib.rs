//! # vs-av
//!
//! Media engine adapter and external tool management for vidsplit.
//!
//! This crate provides:
//!
//! - **The engine contract** ([`MediaEngine`]) -- load once, stage files,
//!   run commands one at a time with per-invocation progress, read results.
//! - **The ffmpeg engine** ([`FfmpegEngine`]) -- [`MediaEngine`] over the
//!   ffmpeg CLI, staging files in a private [`Workspace`].
//! - **Tool discovery** ([`ToolRegistry`]) -- find ffmpeg and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support and line-streamed stderr.
//! - **Probing** ([`FfprobeProber`]) -- source duration and container.
//! - **Command builders** ([`actions`]) -- the lossless trim.

pub mod actions;
pub mod command;
pub mod engine;
pub mod ffmpeg;
pub mod probe;
pub mod progress;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use actions::trim_args;
pub use command::{ToolCommand, ToolOutput};
pub use engine::MediaEngine;
pub use ffmpeg::FfmpegEngine;
pub use probe::{FfprobeProber, SourceInfo};
pub use progress::ProgressSender;
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use workspace::Workspace;
