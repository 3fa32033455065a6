//! Split inputs: the source video and the requested slice length.

use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use vs_core::{Error, Result};

/// A validated split configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRequest {
    slice_seconds: u64,
}

impl SplitRequest {
    /// Validate a slice length.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSliceLength`] when `slice_seconds <= 0`.
    pub fn new(slice_seconds: i64) -> Result<Self> {
        if slice_seconds <= 0 {
            return Err(Error::InvalidSliceLength(format!(
                "must be a positive number of seconds, got {slice_seconds}"
            )));
        }
        Ok(Self {
            slice_seconds: slice_seconds as u64,
        })
    }

    /// Length of each segment in seconds.
    pub fn slice_seconds(&self) -> u64 {
        self.slice_seconds
    }
}

impl FromStr for SplitRequest {
    type Err = Error;

    /// Parse user input such as `"60"`. Anything that is not a whole,
    /// positive number of seconds is rejected.
    fn from_str(s: &str) -> Result<Self> {
        let value: i64 = s.trim().parse().map_err(|_| {
            Error::InvalidSliceLength(format!("not a whole number of seconds: {s:?}"))
        })?;
        Self::new(value)
    }
}

/// The video being split.
///
/// Immutable once created; selecting another source replaces it wholesale.
#[derive(Debug, Clone)]
pub struct SourceVideo {
    name: String,
    duration_seconds: u64,
    data: Bytes,
}

impl SourceVideo {
    /// Wrap in-memory content with its probed duration (whole seconds).
    pub fn new(name: impl Into<String>, data: Bytes, duration_seconds: u64) -> Self {
        Self {
            name: name.into(),
            duration_seconds,
            data,
        }
    }

    /// Read `path` into memory.
    pub async fn from_file(path: &Path, duration_seconds: u64) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "input".to_string());
        Ok(Self::new(name, Bytes::from(data), duration_seconds))
    }

    /// Original file name, for display.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    /// Content handle. Cloning is cheap.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Name the source is staged under inside the engine: `input.<ext>`,
    /// keeping the original extension so the demuxer can be picked by name.
    pub fn staged_name(&self) -> String {
        let ext = Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "mp4".to_string());
        format!("input.{ext}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_positive() {
        assert_eq!(SplitRequest::new(60).unwrap().slice_seconds(), 60);
        assert_eq!("  15 ".parse::<SplitRequest>().unwrap().slice_seconds(), 15);
    }

    #[test]
    fn request_rejects_non_positive_and_non_numeric() {
        for bad in ["0", "-5", "abc", "", "1.5", "60s"] {
            let err = bad.parse::<SplitRequest>().unwrap_err();
            assert!(matches!(err, Error::InvalidSliceLength(_)), "{bad:?}");
        }
        assert!(SplitRequest::new(0).is_err());
    }

    #[test]
    fn staged_name_keeps_extension() {
        let src = SourceVideo::new("Holiday.MOV", Bytes::new(), 10);
        assert_eq!(src.staged_name(), "input.mov");

        let src = SourceVideo::new("no_extension", Bytes::new(), 10);
        assert_eq!(src.staged_name(), "input.mp4");

        let src = SourceVideo::new("weird.m p4", Bytes::new(), 10);
        assert_eq!(src.staged_name(), "input.mp4");
    }

    #[tokio::test]
    async fn from_file_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"abc").unwrap();

        let src = SourceVideo::from_file(&path, 125).await.unwrap();
        assert_eq!(src.name(), "clip.mp4");
        assert_eq!(src.duration_seconds(), 125);
        assert_eq!(src.data().as_ref(), b"abc");
    }

    #[tokio::test]
    async fn from_file_missing_is_io_error() {
        let err = SourceVideo::from_file(Path::new("/nonexistent/clip.mp4"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
