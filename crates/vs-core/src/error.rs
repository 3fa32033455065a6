//! Unified error type for vidsplit.
//!
//! All crates funnel their failures into [`Error`]. Callers that need to
//! branch on the broad failure class (bad input, engine not ready, a run
//! already active, a failed engine invocation) use [`Error::kind`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad failure class for an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad configuration or request data; nothing was started.
    InvalidInput,
    /// The media engine has not finished its one-time load.
    NotReady,
    /// Another run is already active against the engine.
    Conflict,
    /// An engine invocation or its read-back failed.
    ExecutionFailure,
    /// The run was cancelled by the caller.
    Cancelled,
    /// Anything else.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid_input"),
            Self::NotReady => write!(f, "not_ready"),
            Self::Conflict => write!(f, "conflict"),
            Self::ExecutionFailure => write!(f, "execution_failure"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Unified error type covering all failure modes in vidsplit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request or configuration data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A split was requested with no source video selected.
    #[error("No source video loaded")]
    NoSourceLoaded,

    /// The requested slice length is not a positive whole number of seconds.
    #[error("Invalid slice length: {0}")]
    InvalidSliceLength(String),

    /// A split was requested before the engine finished loading.
    #[error("Media engine is not ready")]
    EngineNotReady,

    /// A split was requested while another run is still active.
    #[error("Conflict: a split run is already in progress")]
    RunInProgress,

    /// A segment invocation failed; the run was aborted at this index.
    #[error("Segment {} failed: {message}", .index + 1)]
    SegmentFailed {
        /// 0-based index of the failing segment.
        index: usize,
        /// Underlying cause.
        message: String,
    },

    /// The run was cancelled before it finished.
    #[error("Split run cancelled")]
    Cancelled,

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg, ffprobe) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Media probing failed.
    #[error("Probe error: {0}")]
    Probe(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::InvalidInput,
            Error::NoSourceLoaded => ErrorKind::InvalidInput,
            Error::InvalidSliceLength(_) => ErrorKind::InvalidInput,
            Error::Probe(_) => ErrorKind::InvalidInput,
            Error::EngineNotReady => ErrorKind::NotReady,
            Error::RunInProgress => ErrorKind::Conflict,
            Error::SegmentFailed { .. } => ErrorKind::ExecutionFailure,
            Error::Tool { .. } => ErrorKind::ExecutionFailure,
            Error::Io { .. } => ErrorKind::ExecutionFailure,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::SegmentFailed`].
    pub fn segment(index: usize, cause: impl fmt::Display) -> Self {
        Error::SegmentFailed {
            index,
            message: cause.to_string(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
