use lra_core::error::AppError;

/// Turns text into a fixed-dimension vector. Implementations must return the same dimension
/// for every input under one model.
pub trait Embedder: Send + Sync {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError>;
}

pub mod ollama_embed;
