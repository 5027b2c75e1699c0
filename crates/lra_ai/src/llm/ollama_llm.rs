use lra_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Llm;
use crate::ollama::{upstream_error, OllamaClient};

#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
    max_tokens: u32,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient) -> Self {
        Self {
            client,
            max_tokens: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Llm for OllamaLlm {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError> {
        let url = format!("{}/api/generate", self.client.base_url());
        let req = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: self.max_tokens,
                temperature: 0.0,
            },
        };
        let body = serde_json::to_value(req).map_err(|e| {
            AppError::new("GENERATION_FAILED", "Failed to encode generate request")
                .with_details(e.to_string())
        })?;

        let resp = ureq::post(&url)
            .timeout(self.client.generate_timeout())
            .send_json(body)
            .map_err(|e| upstream_error("GENERATION_FAILED", "Generate", e))?;

        let v: GenerateResponse = resp.into_json().map_err(|e| {
            AppError::new("GENERATION_FAILED", "Failed to decode generate response")
                .with_details(e.to_string())
        })?;
        if v.response.trim().is_empty() {
            return Err(AppError::new("GENERATION_FAILED", "Generate response was empty"));
        }
        Ok(v.response)
    }
}
