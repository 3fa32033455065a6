//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! tool overrides and split defaults. Every section defaults sensibly so a
//! completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::media::Container;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub split: SplitConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.split.slice_seconds <= 0 {
            warnings.push(format!(
                "split.slice_seconds must be a positive integer, got {}",
                self.split.slice_seconds
            ));
        }

        if self.split.exec_timeout_secs == 0 {
            warnings.push("split.exec_timeout_secs is 0; every invocation will time out".into());
        }

        for (name, path) in [
            ("ffmpeg_path", &self.tools.ffmpeg_path),
            ("ffprobe_path", &self.tools.ffprobe_path),
        ] {
            if let Some(p) = path {
                if !p.exists() {
                    warnings.push(format!(
                        "tools.{name} {} does not exist; falling back to PATH",
                        p.display()
                    ));
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Split defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Nominal length of each segment, in seconds.
    #[serde(default = "default_slice_seconds")]
    pub slice_seconds: i64,
    /// Container of the produced segments. Unset means "same as the
    /// source", see [`SplitConfig::output_container`].
    pub container: Option<Container>,
    /// Where the CLI writes finished segments.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Maximum wall time for a single engine invocation.
    #[serde(default = "default_exec_timeout")]
    pub exec_timeout_secs: u64,
}

fn default_slice_seconds() -> i64 {
    60
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}
fn default_exec_timeout() -> u64 {
    600
}

impl SplitConfig {
    /// Container to write segments in for a source probed as `source`.
    ///
    /// Stream copy only works when the output container can hold the
    /// source's codecs, so an unset `container` follows the source, falling
    /// back to mp4 when the source format is unknown.
    pub fn output_container(&self, source: Option<Container>) -> Container {
        self.container.or(source).unwrap_or_default()
    }

    /// The per-invocation timeout as a [`Duration`].
    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_secs)
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            slice_seconds: default_slice_seconds(),
            container: None,
            output_dir: default_output_dir(),
            exec_timeout_secs: default_exec_timeout(),
        }
    }
}
