use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use lra_core::error::{AppError, INDEX_NOT_FOUND};
use serde::{Deserialize, Serialize};

use crate::embeddings::Embedder;

use super::chunking::{chunk_document, ChunkingParams};
use super::model::{Document, EmbeddedChunk};

pub const DEFAULT_INDEX_NAME: &str = "policy_index";

const INDEX_FILE: &str = "index.json";
const LOCK_FILE: &str = ".build.lock";
const FORMAT_VERSION: u32 = 1;
const METRIC_COSINE: &str = "cosine";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStatus {
    pub ready: bool,
    pub model: Option<String>,
    pub dims: Option<u32>,
    pub chunk_count: u32,
    pub source_id: Option<String>,
    pub document_sha256: Option<String>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub built_at: Option<String>,
}

impl IndexStatus {
    fn not_ready() -> Self {
        Self {
            ready: false,
            model: None,
            dims: None,
            chunk_count: 0,
            source_id: None,
            document_sha256: None,
            chunk_size: None,
            chunk_overlap: None,
            built_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexBuildInput {
    pub model: String,
    pub chunking: ChunkingParams,
    pub built_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexBuildResult {
    pub status: IndexStatus,
    /// Chunks sent to the embedder during this build.
    pub embedded: u32,
    /// Chunks whose vectors were carried over from the previous index.
    pub reused: u32,
}

/// On-disk form: one self-describing JSON blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexFile {
    format_version: u32,
    metric: String,
    model: String,
    dims: u32,
    chunk_count: u32,
    source_id: String,
    document_sha256: String,
    chunk_size: usize,
    chunk_overlap: usize,
    built_at: String,
    chunks: Vec<EmbeddedChunk>,
}

/// A loaded, validated index. Read-only; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PolicyIndex {
    file: IndexFile,
}

impl PolicyIndex {
    fn from_file(file: IndexFile, path: &std::path::Path) -> Result<Self, AppError> {
        let corrupt = |msg: &str, details: String| {
            AppError::new("INDEX_CORRUPT", msg.to_string())
                .with_details(format!("path={}; {}", path.display(), details))
        };

        if file.format_version != FORMAT_VERSION {
            return Err(corrupt(
                "Unsupported index format version",
                format!("format_version={}", file.format_version),
            ));
        }
        if file.metric != METRIC_COSINE {
            return Err(corrupt("Unsupported index metric", format!("metric={}", file.metric)));
        }
        if file.dims == 0 {
            return Err(corrupt("Index dims must be positive", "dims=0".to_string()));
        }
        if file.chunks.len() != file.chunk_count as usize {
            return Err(corrupt(
                "Index chunk count does not match stored chunks",
                format!("chunk_count={}; stored={}", file.chunk_count, file.chunks.len()),
            ));
        }
        for (i, c) in file.chunks.iter().enumerate() {
            if c.chunk.ordinal as usize != i {
                return Err(corrupt(
                    "Index chunks are out of insertion order",
                    format!("position={i}; ordinal={}", c.chunk.ordinal),
                ));
            }
            if c.vector.len() != file.dims as usize {
                return Err(corrupt(
                    "Index vector dims mismatch",
                    format!("ordinal={}; expected={}; got={}", i, file.dims, c.vector.len()),
                ));
            }
        }
        Ok(Self { file })
    }

    pub fn model(&self) -> &str {
        &self.file.model
    }

    pub fn dims(&self) -> u32 {
        self.file.dims
    }

    pub fn len(&self) -> usize {
        self.file.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.chunks.is_empty()
    }

    pub fn source_id(&self) -> &str {
        &self.file.source_id
    }

    /// Stored chunks in insertion (document) order.
    pub fn entries(&self) -> &[EmbeddedChunk] {
        &self.file.chunks
    }

    pub fn status(&self) -> IndexStatus {
        IndexStatus {
            ready: true,
            model: Some(self.file.model.clone()),
            dims: Some(self.file.dims),
            chunk_count: self.file.chunk_count,
            source_id: Some(self.file.source_id.clone()),
            document_sha256: Some(self.file.document_sha256.clone()),
            chunk_size: Some(self.file.chunk_size),
            chunk_overlap: Some(self.file.chunk_overlap),
            built_at: Some(self.file.built_at.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
    name: String,
}

impl IndexStore {
    pub fn open(root: PathBuf) -> Self {
        Self::with_name(root, DEFAULT_INDEX_NAME)
    }

    pub fn with_name(root: PathBuf, name: &str) -> Self {
        Self {
            root,
            name: name.to_string(),
        }
    }

    pub fn index_dir(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    fn index_path(&self) -> PathBuf {
        self.index_dir().join(INDEX_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.index_dir().join(LOCK_FILE)
    }

    fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.index_dir()).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", "Failed to create index directory")
                .with_details(format!("path={}; err={}", self.index_dir().display(), e))
        })
    }

    pub fn exists(&self) -> bool {
        self.index_path().is_file()
    }

    /// Summary of the persisted index. A missing index is `ready = false`, not an error.
    pub fn status(&self) -> Result<IndexStatus, AppError> {
        match self.load() {
            Ok(index) => Ok(index.status()),
            Err(e) if e.is(INDEX_NOT_FOUND) => Ok(IndexStatus::not_ready()),
            Err(e) => Err(e),
        }
    }

    pub fn load(&self) -> Result<PolicyIndex, AppError> {
        let path = self.index_path();
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::new(
                    INDEX_NOT_FOUND,
                    "Policy index not found; build the index before querying",
                )
                .with_details(format!("path={}", path.display())));
            }
            Err(e) => {
                return Err(AppError::new("INDEX_CORRUPT", "Failed to read policy index")
                    .with_details(format!("path={}; err={}", path.display(), e)));
            }
        };
        let file: IndexFile = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new("INDEX_CORRUPT", "Failed to decode policy index")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let index = PolicyIndex::from_file(file, &path)?;
        tracing::debug!(
            path = %path.display(),
            chunks = index.len(),
            dims = index.dims(),
            model = index.model(),
            "policy index loaded"
        );
        Ok(index)
    }

    /// Explicitly (re)build the index from `doc`.
    ///
    /// Vectors of chunks whose text is unchanged under the same model are reused from the
    /// previous index. The new blob is written to a temp file and renamed over the live one, so
    /// concurrent readers observe either the old or the new index. Only one build may hold the
    /// build lock at a time.
    pub fn build(
        &self,
        doc: &Document,
        embedder: &dyn Embedder,
        input: IndexBuildInput,
    ) -> Result<IndexBuildResult, AppError> {
        let chunks = chunk_document(doc, &input.chunking);
        if chunks.is_empty() {
            return Err(AppError::new("DOCUMENT_INVALID", "Policy document is empty")
                .with_details(format!("source_id={}", doc.source_id())));
        }

        self.ensure_dirs()?;
        let _lock = BuildLock::acquire(self.lock_path())?;

        let mut reusable: HashMap<String, Vec<f32>> = HashMap::new();
        match self.load() {
            Ok(prev) if prev.model() == input.model => {
                for e in prev.file.chunks {
                    reusable.entry(e.chunk.text_sha256).or_insert(e.vector);
                }
            }
            Ok(prev) => {
                tracing::info!(
                    previous_model = prev.model(),
                    model = %input.model,
                    "embedding model changed; re-embedding every chunk"
                );
            }
            Err(e) if e.is(INDEX_NOT_FOUND) => {}
            Err(e) => {
                tracing::warn!(code = %e.code, "ignoring unreadable previous index during rebuild");
            }
        }

        let mut dims: Option<u32> = None;
        let mut embedded: u32 = 0;
        let mut reused: u32 = 0;
        let mut entries: Vec<EmbeddedChunk> = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let vector = match reusable.get(&chunk.text_sha256) {
                Some(v) => {
                    reused += 1;
                    v.clone()
                }
                None => {
                    let v = embedder.embed(&input.model, &chunk.text).map_err(|e| {
                        let details = e.details.clone().unwrap_or_default();
                        e.with_details(format!("chunk_ordinal={}; {}", chunk.ordinal, details))
                    })?;
                    embedded += 1;
                    v
                }
            };

            let this_dims = vector.len() as u32;
            if this_dims == 0 {
                return Err(AppError::new("INDEX_BUILD_FAILED", "Embedder returned an empty vector")
                    .with_details(format!("chunk_ordinal={}", chunk.ordinal)));
            }
            match dims {
                Some(d) if d != this_dims => {
                    return Err(AppError::new(
                        "INDEX_BUILD_FAILED",
                        "Embedding dimension mismatch across chunks",
                    )
                    .with_details(format!(
                        "expected={}; got={}; chunk_ordinal={}",
                        d, this_dims, chunk.ordinal
                    )));
                }
                Some(_) => {}
                None => dims = Some(this_dims),
            }
            entries.push(EmbeddedChunk { chunk, vector });
        }

        let file = IndexFile {
            format_version: FORMAT_VERSION,
            metric: METRIC_COSINE.to_string(),
            model: input.model,
            dims: dims.unwrap_or(0),
            chunk_count: entries.len() as u32,
            source_id: doc.source_id().to_string(),
            document_sha256: doc.sha256(),
            chunk_size: input.chunking.chunk_size(),
            chunk_overlap: input.chunking.chunk_overlap(),
            built_at: input.built_at,
            chunks: entries,
        };

        // Only after every embedding succeeded.
        self.write_index(&file)?;
        let index = PolicyIndex::from_file(file, &self.index_path())?;

        tracing::info!(
            source_id = index.source_id(),
            chunks = index.len(),
            dims = index.dims(),
            embedded,
            reused,
            "policy index built"
        );

        Ok(IndexBuildResult {
            status: index.status(),
            embedded,
            reused,
        })
    }

    fn write_index(&self, file: &IndexFile) -> Result<(), AppError> {
        let path = self.index_path();
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec(file).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", "Failed to encode policy index")
                .with_details(e.to_string())
        })?;
        fs::write(&tmp, &json).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", "Failed to write policy index")
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            AppError::new("INDEX_BUILD_FAILED", "Failed to finalize policy index write")
                .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
        })?;
        Ok(())
    }
}

/// Exclusive build marker, removed on drop.
#[derive(Debug)]
struct BuildLock {
    path: PathBuf,
}

impl BuildLock {
    fn acquire(path: PathBuf) -> Result<Self, AppError> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut f) => {
                // Best-effort owner marker for operators inspecting a stale lock.
                let _ = write!(f, "pid={}", std::process::id());
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(AppError::new(
                "INDEX_BUILD_IN_PROGRESS",
                "Another index build is in progress",
            )
            .with_details(format!(
                "lock={}; remove it if no build is running",
                path.display()
            ))),
            Err(e) => Err(AppError::new("INDEX_BUILD_FAILED", "Failed to acquire index build lock")
                .with_details(format!("path={}; err={}", path.display(), e))),
        }
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
