//! Encoded pipeline output.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Container format of an encoded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// RIFF/WAVE, 16-bit linear PCM.
    Wav,
    /// WebM with VP8 video and optional Opus audio.
    Webm,
}

impl ContainerKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Webm => "video/webm",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Webm => "webm",
        }
    }
}

/// An immutable encoded blob produced by one successful pipeline run.
///
/// Clones share the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAsset {
    bytes: Arc<[u8]>,
    container: ContainerKind,
    file_name: String,
}

impl EncodedAsset {
    pub fn new(bytes: Vec<u8>, container: ContainerKind, file_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            container,
            file_name: file_name.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn container(&self) -> ContainerKind {
        self.container
    }

    pub fn mime_type(&self) -> &'static str {
        self.container.mime_type()
    }

    /// Suggested download file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// True when both handles point at the same blob.
    pub fn shares_bytes_with(&self, other: &EncodedAsset) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    /// Write the blob to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &self.bytes)
    }
}

/// `<stem>-<suffix>.<ext>` from a source path, e.g. `song-instrumental.wav`.
pub fn derived_file_name(source: &Path, suffix: &str, container: ContainerKind) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output".to_string());
    format!("{stem}-{suffix}.{}", container.extension())
}
