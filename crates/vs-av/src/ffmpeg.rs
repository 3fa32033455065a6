//! [`MediaEngine`] backed by the ffmpeg CLI.
//!
//! Loading resolves and verifies the ffmpeg binary and creates a private
//! [`Workspace`]. Each [`exec`](MediaEngine::exec) runs ffmpeg inside that
//! workspace with `-progress pipe:2`, turning the progress blocks into a
//! fraction of the clip being produced.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{Mutex, OnceCell};

use crate::command::ToolCommand;
use crate::engine::MediaEngine;
use crate::progress::ProgressSender;
use crate::tools::ToolRegistry;
use crate::workspace::Workspace;

/// Default per-invocation timeout: 10 minutes (stream copy is fast).
const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug)]
struct Loaded {
    ffmpeg: PathBuf,
    version: String,
    workspace: Workspace,
}

/// ffmpeg-backed engine.
#[derive(Debug)]
pub struct FfmpegEngine {
    tools: ToolRegistry,
    exec_timeout: Duration,
    loaded: OnceCell<Loaded>,
    // ffmpeg shares the workspace directory; one job at a time.
    job: Mutex<()>,
}

impl FfmpegEngine {
    /// Create an unloaded engine that will take ffmpeg from `tools`.
    pub fn new(tools: ToolRegistry) -> Self {
        Self {
            tools,
            exec_timeout: DEFAULT_EXEC_TIMEOUT,
            loaded: OnceCell::new(),
            job: Mutex::new(()),
        }
    }

    /// Builder: set the maximum wall time of a single invocation.
    pub fn with_exec_timeout(mut self, timeout: Duration) -> Self {
        self.exec_timeout = timeout;
        self
    }

    /// First line of `ffmpeg -version`, once loaded.
    pub fn version(&self) -> Option<&str> {
        self.loaded.get().map(|l| l.version.as_str())
    }

    /// The staging directory, once loaded.
    pub fn workspace_dir(&self) -> Option<&std::path::Path> {
        self.loaded.get().map(|l| l.workspace.path())
    }

    fn loaded(&self) -> vs_core::Result<&Loaded> {
        self.loaded.get().ok_or(vs_core::Error::EngineNotReady)
    }

    async fn initialize(&self) -> vs_core::Result<Loaded> {
        let ffmpeg = self.tools.require("ffmpeg")?.path.clone();

        let output = ToolCommand::new(ffmpeg.clone())
            .arg("-version")
            .timeout(Duration::from_secs(30))
            .execute()
            .await?;
        let version = output.stdout.lines().next().unwrap_or_default().to_string();

        let workspace = Workspace::new()?;
        tracing::info!(
            "ffmpeg engine loaded: {} (workspace {})",
            version,
            workspace.path().display()
        );

        Ok(Loaded {
            ffmpeg,
            version,
            workspace,
        })
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn load(&self) -> vs_core::Result<()> {
        // Concurrent callers wait on the same initialization.
        self.loaded.get_or_try_init(|| self.initialize()).await?;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.loaded.initialized()
    }

    async fn write_input(&self, name: &str, data: Bytes) -> vs_core::Result<()> {
        let loaded = self.loaded()?;
        tracing::debug!("staging {name} ({} bytes)", data.len());
        loaded.workspace.write(name, data).await
    }

    async fn exec(&self, args: &[String], progress: &ProgressSender) -> vs_core::Result<()> {
        let loaded = self.loaded()?;
        let _job = self.job.lock().await;

        tracing::debug!("exec: ffmpeg {}", args.join(" "));

        let mut cmd = ToolCommand::new(loaded.ffmpeg.clone());
        cmd.current_dir(loaded.workspace.path());
        cmd.timeout(self.exec_timeout);
        cmd.args(["-hide_banner", "-nostats", "-progress", "pipe:2"]);
        cmd.args(args.iter().cloned());

        let mut tracker = ProgressTracker::from_args(args);
        progress.send(0.0);
        cmd.execute_with_stderr_callback(|line| match tracker.feed(line) {
            Feed::Progress(fraction) => progress.send(fraction),
            Feed::Consumed => {}
            Feed::Log => tracing::trace!(target: "vs_av::ffmpeg::log", "{line}"),
        })
        .await?;

        Ok(())
    }

    async fn read_output(&self, name: &str) -> vs_core::Result<Bytes> {
        self.loaded()?.workspace.read(name).await
    }

    async fn delete_file(&self, name: &str) -> vs_core::Result<()> {
        self.loaded()?.workspace.remove(name).await
    }
}

// ---------------------------------------------------------------------------
// Progress parsing
// ---------------------------------------------------------------------------

/// What a single stderr line turned out to be.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Feed {
    /// End of a progress block with a computable fraction.
    Progress(f64),
    /// Part of a progress block, nothing to report yet.
    Consumed,
    /// Ordinary ffmpeg log output.
    Log,
}

/// Turns ffmpeg `-progress` blocks into a fraction of the expected clip
/// length.
///
/// The expected length is the `-t` value, bounded by what is left of the
/// input after `-ss` once the input's `Duration:` header has been seen. With
/// neither known, only the final `progress=end` produces a value.
#[derive(Debug, Default)]
struct ProgressTracker {
    start: f64,
    length: Option<f64>,
    input_duration: Option<f64>,
    out_time: Option<f64>,
}

impl ProgressTracker {
    fn from_args(args: &[String]) -> Self {
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .and_then(|v| parse_timestamp(v))
        };
        Self {
            start: value_of("-ss").unwrap_or(0.0),
            length: value_of("-t"),
            ..Self::default()
        }
    }

    fn expected_length(&self) -> Option<f64> {
        let remaining = self.input_duration.map(|d| (d - self.start).max(0.0));
        match (self.length, remaining) {
            (Some(t), Some(r)) => Some(t.min(r)),
            (Some(t), None) => Some(t),
            (None, r) => r,
        }
    }

    fn feed(&mut self, line: &str) -> Feed {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("Duration:") {
            if self.input_duration.is_none() {
                let value = rest.split(',').next().unwrap_or_default();
                self.input_duration = parse_timestamp(value);
            }
            return Feed::Log;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            return Feed::Log;
        };

        match key {
            "out_time_us" | "out_time_ms" => {
                // Both keys are microseconds in ffmpeg's progress output.
                self.out_time = value.parse::<i64>().ok().map(|us| us.max(0) as f64 / 1_000_000.0);
                Feed::Consumed
            }
            "progress" if value == "end" => Feed::Progress(1.0),
            "progress" => match (self.out_time, self.expected_length()) {
                (Some(done), Some(total)) if total > 0.0 => {
                    Feed::Progress((done / total).clamp(0.0, 1.0))
                }
                _ => Feed::Consumed,
            },
            "frame" | "fps" | "bitrate" | "total_size" | "out_time" | "dup_frames"
            | "drop_frames" | "speed" => Feed::Consumed,
            k if k.starts_with("stream_") => Feed::Consumed,
            _ => Feed::Log,
        }
    }
}

/// Parse `SS`, `SS.fff` or `[HH:]MM:SS[.fff]` into seconds.
fn parse_timestamp(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s == "N/A" {
        return None;
    }
    let mut total = 0.0;
    for part in s.split(':') {
        let v: f64 = part.parse().ok()?;
        if v < 0.0 {
            return None;
        }
        total = total * 60.0 + v;
    }
    Some(total)
}
