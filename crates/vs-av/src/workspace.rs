//! Staging directory for engine invocations.
//!
//! A [`Workspace`] is the engine's private working directory: the source is
//! written into it, ffmpeg runs with it as the current directory, and segment
//! outputs are read back out of it. Files are addressed by bare name only.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use tempfile::TempDir;

/// Temporary working directory, removed when dropped.
///
/// # Example
///
/// ```no_run
/// # async fn example() -> vs_core::Result<()> {
/// use vs_av::Workspace;
///
/// let workspace = Workspace::new()?;
/// workspace.write("input.mp4", bytes::Bytes::from_static(b"...")).await?;
/// let data = workspace.read("input.mp4").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a workspace under the system temp directory.
    pub fn new() -> vs_core::Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("vidsplit-")
            .tempdir()
            .map_err(|e| vs_core::Error::tool("workspace", format!("failed to create temp dir: {e}")))?;
        Ok(Self { temp_dir })
    }

    /// Path to the working directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Resolve a bare file name inside the workspace.
    ///
    /// Names containing path separators, `..`, or nothing at all are
    /// rejected so nothing outside the workspace can be touched.
    pub fn file(&self, name: &str) -> vs_core::Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.temp_dir.path().join(name)),
            _ => Err(vs_core::Error::Validation(format!(
                "invalid workspace file name: {name:?}"
            ))),
        }
    }

    /// Write `data` to `name`, replacing any existing file.
    pub async fn write(&self, name: &str, data: Bytes) -> vs_core::Result<()> {
        let path = self.file(name)?;
        tokio::fs::write(&path, &data).await?;
        Ok(())
    }

    /// Read the whole of `name` into memory.
    pub async fn read(&self, name: &str) -> vs_core::Result<Bytes> {
        let path = self.file(name)?;
        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                vs_core::Error::tool("workspace", format!("output file does not exist: {name}"))
            } else {
                vs_core::Error::from(e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    /// Remove `name`. Removing a file that does not exist is not an error.
    pub async fn remove(&self, name: &str) -> vs_core::Result<()> {
        let path = self.file(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_inside_workspace() {
        let ws = Workspace::new().unwrap();
        let f = ws.file("output_1.mp4").unwrap();
        assert!(f.starts_with(ws.path()));
        assert_eq!(f.file_name().unwrap(), "output_1.mp4");
    }

    #[test]
    fn file_rejects_escapes() {
        let ws = Workspace::new().unwrap();
        assert!(ws.file("../etc/passwd").is_err());
        assert!(ws.file("sub/output.mp4").is_err());
        assert!(ws.file("/abs.mp4").is_err());
        assert!(ws.file("..").is_err());
        assert!(ws.file("").is_err());
    }

    #[tokio::test]
    async fn write_read_remove() {
        let ws = Workspace::new().unwrap();
        ws.write("input.mp4", Bytes::from_static(b"payload")).await.unwrap();
        assert!(ws.path().join("input.mp4").is_file());
        assert_eq!(ws.read("input.mp4").await.unwrap(), Bytes::from_static(b"payload"));

        ws.remove("input.mp4").await.unwrap();
        assert!(!ws.path().join("input.mp4").exists());
        // Second remove is a no-op.
        ws.remove("input.mp4").await.unwrap();
    }

    #[tokio::test]
    async fn read_missing_is_tool_error() {
        let ws = Workspace::new().unwrap();
        let err = ws.read("output_9.mp4").await.unwrap_err();
        assert!(err.to_string().contains("output_9.mp4"), "got: {err}");
    }

    #[test]
    fn cleanup_on_drop() {
        let ws = Workspace::new().unwrap();
        let dir = ws.path().to_path_buf();
        assert!(dir.is_dir());
        drop(ws);
        assert!(!dir.exists());
    }
}
