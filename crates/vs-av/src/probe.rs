//! Source probing via the ffprobe CLI.
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format` and keeps
//! what splitting needs: the duration in whole seconds and the container.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vs_core::Container;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// What the splitter needs to know about a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Duration truncated to whole seconds.
    pub duration_seconds: u64,
    /// Exact duration as reported by ffprobe.
    pub duration_exact: f64,
    /// ffprobe's `format_name`, e.g. `mov,mp4,m4a,3gp,3g2,mj2`.
    pub format_name: Option<String>,
    /// Container guessed from `format_name`, if it is one we can write.
    pub container: Option<Container>,
    /// File size in bytes, if reported.
    pub size: Option<u64>,
}

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self { ffprobe_path }
    }

    /// Create a prober from a discovered tool registry.
    pub fn from_registry(tools: &ToolRegistry) -> vs_core::Result<Self> {
        Ok(Self::new(tools.require("ffprobe")?.path.clone()))
    }

    /// Probe `path`.
    pub async fn probe(&self, path: &Path) -> vs_core::Result<SourceInfo> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.timeout(Duration::from_secs(60));
        cmd.args(["-v", "quiet", "-print_format", "json", "-show_format"]);
        cmd.arg(path.to_string_lossy().as_ref());

        let output = cmd.execute().await?;
        parse_ffprobe_output(&output.stdout)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    size: Option<String>,
}

/// Map ffprobe's JSON into a [`SourceInfo`].
///
/// A missing or unparsable duration is a [`vs_core::Error::Probe`]: without
/// it no split can be planned.
pub fn parse_ffprobe_output(json: &str) -> vs_core::Result<SourceInfo> {
    let ff: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| vs_core::Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

    let duration_exact = ff
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| vs_core::Error::Probe("source duration is missing".into()))?;

    let container = ff.format.format_name.as_deref().and_then(container_from_format);

    Ok(SourceInfo {
        duration_seconds: duration_exact.floor() as u64,
        duration_exact,
        container,
        format_name: ff.format.format_name,
        size: ff.format.size.and_then(|s| s.parse().ok()),
    })
}

fn container_from_format(format_name: &str) -> Option<Container> {
    let names: Vec<&str> = format_name.split(',').collect();
    if names.contains(&"mp4") {
        Some(Container::Mp4)
    } else if names.contains(&"mov") {
        Some(Container::Mov)
    } else if names.contains(&"matroska") {
        Some(Container::Mkv)
    } else if names.contains(&"webm") {
        Some(Container::Webm)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mp4_format() {
        let json = r#"{
            "format": {
                "filename": "clip.mp4",
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
                "duration": "125.480000",
                "size": "1048576"
            }
        }"#;
        let info = parse_ffprobe_output(json).unwrap();
        assert_eq!(info.duration_seconds, 125);
        assert!((info.duration_exact - 125.48).abs() < 1e-9);
        assert_eq!(info.container, Some(Container::Mp4));
        assert_eq!(info.size, Some(1_048_576));
    }

    #[test]
    fn parses_matroska_format() {
        let json = r#"{"format": {"format_name": "matroska,webm", "duration": "59.999"}}"#;
        let info = parse_ffprobe_output(json).unwrap();
        assert_eq!(info.duration_seconds, 59);
        assert_eq!(info.container, Some(Container::Mkv));
        assert_eq!(info.size, None);
    }

    #[test]
    fn missing_duration_is_probe_error() {
        let json = r#"{"format": {"format_name": "image2"}}"#;
        let err = parse_ffprobe_output(json).unwrap_err();
        assert!(matches!(err, vs_core::Error::Probe(_)));
        assert_eq!(err.kind(), vs_core::ErrorKind::InvalidInput);
    }

    #[test]
    fn garbage_json_is_probe_error() {
        assert!(matches!(
            parse_ffprobe_output("not json"),
            Err(vs_core::Error::Probe(_))
        ));
    }

    #[test]
    fn unknown_format_has_no_container() {
        let json = r#"{"format": {"format_name": "avi", "duration": "10.0"}}"#;
        assert_eq!(parse_ffprobe_output(json).unwrap().container, None);
    }
}
