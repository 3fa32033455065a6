//! The [`MediaEngine`] trait: a load-once command executor with a private
//! file area.

use async_trait::async_trait;
use bytes::Bytes;

use crate::progress::ProgressSender;

/// A media-processing engine driven one command at a time.
///
/// The engine must be [`load`](MediaEngine::load)ed once before anything
/// else is called; until then every other operation fails with
/// [`vs_core::Error::EngineNotReady`]. After loading it behaves as a
/// re-usable executor that keeps no state between invocations beyond the
/// files it was asked to hold.
///
/// Implementations are not required to support concurrent invocations.
/// Callers run one [`exec`](MediaEngine::exec) at a time and read its output
/// back before starting the next.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// A short, human-readable name for this engine (e.g. "ffmpeg").
    fn name(&self) -> &'static str;

    /// Perform the one-time initialization. Calling it again after it
    /// succeeded is a no-op.
    async fn load(&self) -> vs_core::Result<()>;

    /// Whether [`load`](MediaEngine::load) has completed successfully.
    fn is_ready(&self) -> bool;

    /// Store `data` under `name` in the engine's file area.
    async fn write_input(&self, name: &str, data: Bytes) -> vs_core::Result<()>;

    /// Run one command. Progress for this invocation only is reported
    /// through `progress` as a fraction in `[0, 1]`.
    async fn exec(&self, args: &[String], progress: &ProgressSender) -> vs_core::Result<()>;

    /// Read back a file produced by an earlier [`exec`](MediaEngine::exec).
    async fn read_output(&self, name: &str) -> vs_core::Result<Bytes>;

    /// Drop `name` from the engine's file area. The default does nothing.
    async fn delete_file(&self, _name: &str) -> vs_core::Result<()> {
        Ok(())
    }
}
