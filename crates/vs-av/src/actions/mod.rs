//! Engine command builders.

mod trim;

pub use trim::trim_args;
