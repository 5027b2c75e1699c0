use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lra_ai::embeddings::ollama_embed::OllamaEmbedder;
use lra_ai::embeddings::Embedder;
use lra_ai::guardrails::{PiiGuard, RedactionResult};
use lra_ai::llm::ollama_llm::OllamaLlm;
use lra_ai::llm::Llm;
use lra_ai::ollama::OllamaClient;
use lra_ai::pipeline::{DecisionPipeline, DecisionResponse, PipelineSettings};
use lra_ai::policy::{ChunkingParams, Document, IndexBuildInput, IndexBuildResult, IndexStatus, IndexStore};
use lra_ai::retrieve::{RetrievedChunk, Retriever};
use lra_ai::retry::{RetryPolicy, Retrying};
use lra_core::config::AppConfig;
use lra_core::domain::{ApplicationRequest, FeedbackRating, FeedbackRecord};
use lra_core::error::{AppError, INDEX_NOT_FOUND};
use lra_core::feedback::{feedback_record, now_timestamp, FeedbackSink};
use lra_core::rules::RuleSet;
use lra_core::validate::ensure_valid_application;

#[derive(Debug, serde::Serialize)]
pub struct AiHealthStatus {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, serde::Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub hits: Vec<RetrievedChunk>,
}

#[derive(Debug, serde::Serialize)]
pub struct FeedbackAck {
    pub ok: bool,
    pub record: FeedbackRecord,
}

/// Explicitly constructed dependencies for one CLI invocation.
pub struct AppContext {
    config: AppConfig,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn Llm>,
}

impl AppContext {
    pub fn new(config: AppConfig, embedder: Arc<dyn Embedder>, llm: Arc<dyn Llm>) -> Self {
        Self {
            config,
            embedder,
            llm,
        }
    }

    /// Ollama-backed context; model calls retry per the configured policy.
    pub fn with_ollama(config: AppConfig) -> Result<Self, AppError> {
        let client = ollama_client(&config)?;
        let retry = RetryPolicy::from(&config.retry);
        let embedder: Arc<dyn Embedder> = Arc::new(Retrying::new(
            OllamaEmbedder::new(client.clone()),
            retry.clone(),
        ));
        let llm: Arc<dyn Llm> = Arc::new(Retrying::new(OllamaLlm::new(client), retry));
        Ok(Self::new(config, embedder, llm))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn index_store(&self) -> IndexStore {
        IndexStore::open(self.config.data_dir.clone())
    }

    pub fn index_policy(&self, policy: Option<&Path>) -> Result<IndexBuildResult, AppError> {
        let path = policy.unwrap_or(self.config.policy_path.as_path());
        let doc = Document::from_path(path)?;
        let input = IndexBuildInput {
            model: self.config.ollama.embed_model.clone(),
            chunking: ChunkingParams::from_config(&self.config.chunking)?,
            built_at: now_timestamp()?,
        };
        self.index_store().build(&doc, self.embedder.as_ref(), input)
    }

    pub fn index_status(&self) -> Result<IndexStatus, AppError> {
        self.index_store().status()
    }

    pub fn search(&self, query: &str, k: Option<u32>) -> Result<SearchResponse, AppError> {
        let retriever = Retriever::open(&self.index_store(), self.embedder.clone())?;
        let hits = retriever.search(query, k.unwrap_or(self.config.retrieval.top_k))?;
        Ok(SearchResponse {
            query: query.to_string(),
            hits,
        })
    }

    pub fn decide(
        &self,
        req: &ApplicationRequest,
        rebuild_if_missing: bool,
    ) -> Result<DecisionResponse, AppError> {
        // Checked here too so a rebuild never starts for an application that cannot be decided.
        ensure_valid_application(req)?;
        let retriever = match Retriever::open(&self.index_store(), self.embedder.clone()) {
            Ok(r) => r,
            Err(e) if e.is(INDEX_NOT_FOUND) && rebuild_if_missing => {
                tracing::warn!(
                    policy = %self.config.policy_path.display(),
                    "policy index missing; building before deciding"
                );
                self.index_policy(None)?;
                Retriever::open(&self.index_store(), self.embedder.clone())?
            }
            Err(e) => return Err(e),
        };

        let pipeline = DecisionPipeline::new(
            retriever,
            self.llm.clone(),
            self.guard(),
            RuleSet::from_config(&self.config.rules)?,
            PipelineSettings::from_config(&self.config),
        );
        pipeline.decide(req)
    }

    pub fn scrub(&self, text: &str) -> RedactionResult {
        self.guard().scrub(text)
    }

    /// Append a rating. Details and correction are scrubbed before they are written.
    pub fn record_feedback(
        &self,
        sink: &dyn FeedbackSink,
        req: &ApplicationRequest,
        ai_response: &str,
        rating: FeedbackRating,
        correction: Option<String>,
    ) -> Result<FeedbackAck, AppError> {
        let guard = self.guard();
        let scrubbed = ApplicationRequest {
            details: guard.scrub(&req.details).clean_text,
            ..req.clone()
        };
        let correction = correction.map(|c| guard.scrub(&c).clean_text);
        let record = feedback_record(&scrubbed, ai_response, rating, correction, now_timestamp()?);
        sink.append(&record)?;
        Ok(FeedbackAck { ok: true, record })
    }

    fn guard(&self) -> PiiGuard {
        PiiGuard::from_config(&self.config.content_policy)
    }
}

pub fn ollama_client(config: &AppConfig) -> Result<OllamaClient, AppError> {
    Ok(OllamaClient::new(&config.ollama.base_url)?.with_timeouts(
        Duration::from_secs(config.ollama.embed_timeout_secs),
        Duration::from_secs(config.ollama.generate_timeout_secs),
    ))
}

pub fn ai_health_check(config: &AppConfig) -> Result<AiHealthStatus, AppError> {
    let client = ollama_client(config)?;
    client.health_check()?;
    Ok(AiHealthStatus {
        ok: true,
        message: format!("Ollama reachable on {}", client.base_url()),
    })
}
