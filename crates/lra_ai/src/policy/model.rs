use std::fs;
use std::path::Path;

use lra_core::error::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Source policy text. Immutable once loaded; line endings are normalized to `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    source_id: String,
    text: String,
}

impl Document {
    pub fn new(source_id: impl Into<String>, text: &str) -> Self {
        Self {
            source_id: source_id.into(),
            text: normalize_text(text),
        }
    }

    /// Load a policy document; the source id is the file name.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|e| {
            AppError::new("DOCUMENT_INVALID", "Failed to read policy document")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let source_id = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(source_id, &text))
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn sha256(&self) -> String {
        sha256_hex(self.text.as_bytes())
    }
}

/// A window of a [`Document`]. Offsets and lengths count characters, not bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub source_id: String,
    pub ordinal: u32,
    pub start_offset: usize,
    pub length: usize,
    pub text: String,
    pub text_sha256: String,
}

impl Chunk {
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.length
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

pub(crate) fn normalize_text(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}
