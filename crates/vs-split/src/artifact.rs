//! Produced segments.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use vs_core::Container;

/// One produced segment, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// 0-based segment index.
    pub index: usize,
    /// `output_<index + 1>.<ext>`.
    pub name: String,
    /// Container of `data`.
    pub container: Container,
    /// Segment content. Cloning is cheap.
    pub data: Bytes,
    /// Content-addressed download reference: `sha256:<hex>`.
    pub reference: String,
}

impl Artifact {
    pub fn new(index: usize, name: impl Into<String>, container: Container, data: Bytes) -> Self {
        let reference = content_reference(&data);
        Self {
            index,
            name: name.into(),
            container,
            data,
            reference,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn mime_type(&self) -> &'static str {
        self.container.mime_type()
    }

    /// Write the segment into `dir` under its own name.
    pub async fn save_to(&self, dir: &Path) -> vs_core::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.name);
        tokio::fs::write(&path, &self.data).await?;
        Ok(path)
    }

    /// The serialisable description handed to status observers.
    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            index: self.index,
            name: self.name.clone(),
            reference: self.reference.clone(),
            size: self.size(),
            mime_type: self.mime_type().to_string(),
        }
    }
}

/// An artifact without its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub index: usize,
    pub name: String,
    pub reference: String,
    pub size: u64,
    pub mime_type: String,
}

/// `sha256:<hex>` of `data`.
pub fn content_reference(data: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(data)))
}
