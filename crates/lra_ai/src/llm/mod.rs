use lra_core::error::AppError;

/// Text generation. Output is untrusted and must pass the content policy before it is shown.
pub trait Llm: Send + Sync {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError>;
}

pub mod ollama_llm;
