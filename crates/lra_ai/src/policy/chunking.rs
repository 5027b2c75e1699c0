use lra_core::config::ChunkingConfig;
use lra_core::error::{AppError, INVALID_CONFIGURATION};

use super::model::{sha256_hex, Chunk, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl ChunkingParams {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, AppError> {
        if chunk_size == 0 {
            return Err(AppError::new(INVALID_CONFIGURATION, "chunk_size must be positive"));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::new(
                INVALID_CONFIGURATION,
                "chunk_overlap must be smaller than chunk_size",
            )
            .with_details(format!("chunk_size={chunk_size}; chunk_overlap={chunk_overlap}")));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(cfg: &ChunkingConfig) -> Result<Self, AppError> {
        Self::new(cfg.chunk_size, cfg.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

/// Split a document into fixed-size character windows.
///
/// Consecutive windows share exactly `chunk_overlap` characters; the last window ends at the
/// end of the document and may be shorter. Every character lands in at least one chunk and no
/// chunk is empty. An empty document yields no chunks.
pub fn chunk_document(doc: &Document, params: &ChunkingParams) -> Vec<Chunk> {
    let chars: Vec<(usize, char)> = doc.text().char_indices().collect();
    let total = chars.len();
    let byte_at = |char_idx: usize| -> usize {
        if char_idx >= total {
            doc.text().len()
        } else {
            chars[char_idx].0
        }
    };

    let mut out = Vec::new();
    let mut start = 0usize;
    let mut ordinal: u32 = 0;
    while start < total {
        let end = (start + params.chunk_size).min(total);
        let text = doc.text()[byte_at(start)..byte_at(end)].to_string();
        out.push(Chunk {
            source_id: doc.source_id().to_string(),
            ordinal,
            start_offset: start,
            length: end - start,
            text_sha256: sha256_hex(text.as_bytes()),
            text,
        });
        if end == total {
            break;
        }
        start += params.stride();
        ordinal += 1;
    }
    out
}
