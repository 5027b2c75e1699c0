use std::sync::Arc;

use lra_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::embeddings::Embedder;
use crate::policy::{Chunk, IndexStore, PolicyIndex};

mod similarity;

pub const MAX_TOP_K: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query.
    pub score: f32,
    /// `1 - score`; results are ordered by ascending distance.
    pub distance: f32,
    /// 1-based position in the result list.
    pub rank: u32,
}

/// Nearest-neighbour search over a loaded policy index.
///
/// The index is loaded once and never mutated, so one `Retriever` may serve concurrent
/// searches. A rebuilt index is picked up by opening a new `Retriever`.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<PolicyIndex>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn open(store: &IndexStore, embedder: Arc<dyn Embedder>) -> Result<Self, AppError> {
        let index = store.load()?;
        Ok(Self::new(Arc::new(index), embedder))
    }

    pub fn new(index: Arc<PolicyIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    pub fn index(&self) -> &PolicyIndex {
        &self.index
    }

    pub fn search(&self, query: &str, k: u32) -> Result<Vec<RetrievedChunk>, AppError> {
        let q = query.trim();
        if q.is_empty() {
            return Err(AppError::new("RETRIEVAL_FAILED", "Query must not be empty"));
        }
        let k = k.clamp(1, MAX_TOP_K) as usize;
        let dims = self.index.dims();

        let qv = self.embedder.embed(self.index.model(), q)?;
        if qv.len() as u32 != dims {
            return Err(AppError::new(
                "RETRIEVAL_FAILED",
                "Query embedding dims do not match index dims",
            )
            .with_details(format!("index_dims={dims}; query_dims={}", qv.len())));
        }
        let qnorm = similarity::l2_norm(&qv);
        if qnorm == 0.0 {
            return Err(AppError::new(
                "RETRIEVAL_FAILED",
                "Query embedding norm is zero",
            ));
        }

        // (position in index, score); position is the insertion order.
        let mut hits: Vec<(usize, f32)> = Vec::with_capacity(self.index.len());
        for (pos, entry) in self.index.entries().iter().enumerate() {
            let vnorm = similarity::l2_norm(&entry.vector);
            if vnorm == 0.0 {
                continue;
            }
            let score = similarity::cosine_similarity(&qv, &entry.vector, qnorm, vnorm);
            hits.push((pos, score));
        }

        hits.sort_by(|a, b| {
            let da = 1.0 - a.1;
            let db = 1.0 - b.1;
            da.total_cmp(&db).then(a.0.cmp(&b.0))
        });
        hits.truncate(k);

        let entries = self.index.entries();
        let out = hits
            .into_iter()
            .enumerate()
            .map(|(i, (pos, score))| RetrievedChunk {
                chunk: entries[pos].chunk.clone(),
                score,
                distance: 1.0 - score,
                rank: i as u32 + 1,
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            query_chars = q.chars().count(),
            k,
            returned = out.len(),
            "policy search"
        );
        Ok(out)
    }
}

/// Load the index and run one search.
pub fn search_policy(
    store: &IndexStore,
    embedder: Arc<dyn Embedder>,
    query: &str,
    k: u32,
) -> Result<Vec<RetrievedChunk>, AppError> {
    Retriever::open(store, embedder)?.search(query, k)
}
