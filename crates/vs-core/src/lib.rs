//! vs-core: shared types, IDs, errors, configuration, and event system.
//!
//! This crate is the foundational dependency for the other vs-* crates,
//! providing the run identifier, a unified error type, output container
//! formats, application configuration, and a broadcast event bus.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, ErrorKind, Result};
pub use ids::RunId;
pub use media::Container;
