use lra_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::ollama::{upstream_error, OllamaClient};

const MAX_EMBED_INPUT_CHARS: usize = 12_000;

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        // Chunking keeps inputs small; queries are bounded here.
        let prompt = bounded_input(input);

        let url = format!("{}/api/embeddings", self.client.base_url());
        let req = EmbeddingsRequest { model, prompt };
        let body = serde_json::to_value(req).map_err(|e| {
            AppError::new("EMBEDDING_FAILED", "Failed to encode embeddings request")
                .with_details(e.to_string())
        })?;
        let resp = ureq::post(&url)
            .timeout(self.client.embed_timeout())
            .send_json(body)
            .map_err(|e| upstream_error("EMBEDDING_FAILED", "Embeddings", e))?;

        let v: EmbeddingsResponse = resp.into_json().map_err(|e| {
            AppError::new("EMBEDDING_FAILED", "Failed to decode embeddings response")
                .with_details(e.to_string())
        })?;
        if v.embedding.is_empty() {
            return Err(AppError::new(
                "EMBEDDING_FAILED",
                "Embeddings response was empty",
            ));
        }
        Ok(v.embedding)
    }
}

fn bounded_input(input: &str) -> &str {
    match input.char_indices().nth(MAX_EMBED_INPUT_CHARS) {
        Some((idx, _)) => {
            tracing::debug!(
                input_chars = input.chars().count(),
                kept_chars = MAX_EMBED_INPUT_CHARS,
                "embedding input truncated"
            );
            &input[..idx]
        }
        None => input,
    }
}
