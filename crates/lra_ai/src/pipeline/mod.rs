use std::sync::Arc;

use lra_core::config::AppConfig;
use lra_core::domain::ApplicationRequest;
use lra_core::error::AppError;
use lra_core::rules::{RuleFinding, RuleMode, RuleSet};
use lra_core::validate::ensure_valid_application;
use serde::{Deserialize, Serialize};

use crate::guardrails::PiiGuard;
use crate::llm::Llm;
use crate::prompt::{build_decision_prompt, format_usd, ContextBudget};
use crate::retrieve::{RetrievedChunk, Retriever};

pub const BLOCKED_RESPONSE: &str = "Response Blocked by Safety Policy.";
pub const REJECTED_MARKER: &str = "REJECTED";
pub const ESCALATION_MARKER: &str = "Executive Risk Committee";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Rejected,
    /// Referred to the Executive Risk Committee.
    Escalated,
    Blocked,
    Proceed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecidedBy {
    Rules,
    Model,
}

/// Policy chunk that was placed in the prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub ordinal: u32,
    pub start_offset: usize,
    pub length: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionResponse {
    pub decision_text: String,
    pub pii_detected: Vec<String>,
    pub blocked: bool,
    pub block_reason: Option<String>,
    pub status: DecisionStatus,
    pub decided_by: DecidedBy,
    pub rule_findings: Vec<RuleFinding>,
    pub citations: Vec<Citation>,
    /// The details text as the model saw it.
    pub redacted_details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub model: String,
    pub top_k: u32,
    pub budget: ContextBudget,
}

impl PipelineSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            model: cfg.ollama.generate_model.clone(),
            top_k: cfg.retrieval.top_k,
            budget: ContextBudget {
                max_context_chars: cfg.retrieval.max_context_chars,
            },
        }
    }
}

/// One decision cycle per call: validate, scrub, pre-screen, retrieve, prompt, generate, screen.
///
/// Holds no per-request state; concurrent `decide` calls share only the read-only index.
pub struct DecisionPipeline {
    retriever: Retriever,
    llm: Arc<dyn Llm>,
    guard: PiiGuard,
    rules: RuleSet,
    settings: PipelineSettings,
}

impl DecisionPipeline {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn Llm>,
        guard: PiiGuard,
        rules: RuleSet,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            retriever,
            llm,
            guard,
            rules,
            settings,
        }
    }

    pub fn guard(&self) -> &PiiGuard {
        &self.guard
    }

    pub fn decide(&self, req: &ApplicationRequest) -> Result<DecisionResponse, AppError> {
        // Invalid input never reaches the embedder or the model.
        ensure_valid_application(req)?;

        let redaction = self.guard.scrub(&req.details);
        let scrubbed = ApplicationRequest {
            details: redaction.clean_text.clone(),
            ..req.clone()
        };

        let findings = self.rules.evaluate(&scrubbed);
        let hard_stop = findings.iter().any(|f| f.hard_stop);
        if hard_stop && self.rules.mode() == RuleMode::Enforce {
            tracing::info!(
                findings = findings.len(),
                pii = redaction.detected_categories.len(),
                "decision completed by pre-screen rules"
            );
            return Ok(DecisionResponse {
                decision_text: rules_rejection_text(&findings),
                pii_detected: redaction.detected_categories,
                blocked: false,
                block_reason: None,
                status: DecisionStatus::Rejected,
                decided_by: DecidedBy::Rules,
                rule_findings: findings,
                citations: Vec::new(),
                redacted_details: redaction.clean_text,
            });
        }

        let query = retrieval_query(&scrubbed);
        let retrieved = self.retriever.search(&query, self.settings.top_k)?;
        let prompt = build_decision_prompt(&retrieved, &scrubbed, &findings, &self.settings.budget);
        tracing::debug!(
            retrieved = retrieved.len(),
            included = prompt.included.len(),
            evicted = prompt.evicted.len(),
            prompt_chars = prompt.text.chars().count(),
            "decision prompt assembled"
        );

        let output = self.llm.generate(&self.settings.model, &prompt.text)?;

        let verdict = self.guard.validate_content_policy(&output);
        let response = if verdict.is_safe {
            DecisionResponse {
                status: classify(&output),
                decision_text: output,
                pii_detected: redaction.detected_categories,
                blocked: false,
                block_reason: None,
                decided_by: DecidedBy::Model,
                rule_findings: findings,
                citations: citations(&prompt.included),
                redacted_details: redaction.clean_text,
            }
        } else {
            tracing::warn!(reason = %verdict.reason, "model output blocked by content policy");
            DecisionResponse {
                decision_text: BLOCKED_RESPONSE.to_string(),
                pii_detected: redaction.detected_categories,
                blocked: true,
                block_reason: Some(verdict.reason),
                status: DecisionStatus::Blocked,
                decided_by: DecidedBy::Model,
                rule_findings: findings,
                citations: citations(&prompt.included),
                redacted_details: redaction.clean_text,
            }
        };

        tracing::info!(
            status = ?response.status,
            decided_by = ?response.decided_by,
            pii = response.pii_detected.len(),
            citations = response.citations.len(),
            "decision completed"
        );
        Ok(response)
    }
}

/// Query text built only from scrubbed facts.
pub fn retrieval_query(req: &ApplicationRequest) -> String {
    format!(
        "Commercial loan application. Industry: {}. Loan amount: ${}. Credit score: {}. Details: {}",
        req.industry,
        format_usd(req.amount_usd),
        req.credit_score,
        req.details.trim()
    )
}

fn rules_rejection_text(findings: &[RuleFinding]) -> String {
    let mut out = format!("{REJECTED_MARKER}. The application fails the bank's pre-screen rules:");
    for f in findings.iter().filter(|f| f.hard_stop) {
        out.push_str(&format!("\n- {}: {}", f.rule, f.message));
        if let Some(ev) = &f.evidence {
            out.push_str(&format!(" (matched \"{ev}\")"));
        }
    }
    out
}

fn classify(output: &str) -> DecisionStatus {
    if output.contains(REJECTED_MARKER) {
        DecisionStatus::Rejected
    } else if output.contains(ESCALATION_MARKER) {
        DecisionStatus::Escalated
    } else {
        DecisionStatus::Proceed
    }
}

fn citations(included: &[RetrievedChunk]) -> Vec<Citation> {
    included
        .iter()
        .map(|rc| Citation {
            ordinal: rc.chunk.ordinal,
            start_offset: rc.chunk.start_offset,
            length: rc.chunk.length,
            score: rc.score,
        })
        .collect()
}
