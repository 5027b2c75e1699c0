use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lra_core::domain::{ApplicationRequest, FeedbackRating, Industry};
use lra_core::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "loan-risk-agent",
    version,
    about = "Policy-grounded commercial loan decisions with PII and content guardrails"
)]
pub struct Cli {
    /// TOML config file (default: ./loan-risk-agent.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Emit logs as JSON on stderr.
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build (or incrementally rebuild) the policy index.
    Index {
        #[arg(long)]
        policy: Option<PathBuf>,
    },
    /// Show the persisted index summary.
    Status,
    /// Retrieve the policy chunks closest to a query.
    Search {
        query: String,
        #[arg(short = 'k', long = "top-k")]
        k: Option<u32>,
    },
    /// Run one decision cycle for an application.
    Decide {
        #[command(flatten)]
        application: ApplicationArgs,
        /// Build the index from the configured policy when none exists, then retry once.
        #[arg(long = "rebuild-if-missing")]
        rebuild_if_missing: bool,
    },
    /// Redact PII from free text.
    Scrub { text: String },
    /// Record a human rating of a decision.
    Feedback {
        #[command(flatten)]
        application: ApplicationArgs,
        /// The decision text that was shown.
        #[arg(long)]
        response: String,
        #[arg(long)]
        rating: FeedbackRating,
        #[arg(long)]
        correction: Option<String>,
    },
    /// Check that the local model server answers.
    Health,
}

#[derive(Args, Debug, Clone)]
pub struct ApplicationArgs {
    #[arg(long)]
    pub name: String,
    /// Requested amount in whole USD.
    #[arg(long)]
    pub amount: u64,
    #[arg(long)]
    pub score: u16,
    /// Industry label, e.g. "Manufacturing" or "Crypto/Mining".
    #[arg(long)]
    pub industry: Industry,
    #[arg(long)]
    pub details: String,
}

impl From<ApplicationArgs> for ApplicationRequest {
    fn from(a: ApplicationArgs) -> Self {
        Self {
            applicant_name: a.name,
            amount_usd: a.amount,
            credit_score: a.score,
            industry: a.industry,
            details: a.details,
        }
    }
}

/// Process exit status for a failed command.
pub fn exit_code_for(err: &AppError) -> u8 {
    match err.code.as_str() {
        "INVALID_CONFIGURATION" | "APPLICATION_INVALID" => 2,
        "INDEX_NOT_FOUND" | "INDEX_CORRUPT" | "INDEX_BUILD_IN_PROGRESS" => 3,
        "UPSTREAM_UNAVAILABLE" => 4,
        _ => 1,
    }
}
