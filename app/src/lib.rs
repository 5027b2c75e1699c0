pub mod cli;
pub mod commands;
pub mod logging;

use lra_ai::guardrails::PiiGuard;
use lra_ai::policy::IndexStore;
use lra_core::config::AppConfig;
use lra_core::error::AppError;
use lra_core::feedback::CsvFeedbackLog;
use serde::Serialize;

use cli::{Cli, Commands};
use commands::{ai_health_check, AppContext};

/// Run one command and return its JSON result.
pub fn run(cli: Cli) -> Result<serde_json::Value, AppError> {
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Health => to_json(&ai_health_check(&config)?),
        Commands::Scrub { text } => {
            to_json(&PiiGuard::from_config(&config.content_policy).scrub(&text))
        }
        Commands::Status => to_json(&IndexStore::open(config.data_dir.clone()).status()?),
        Commands::Index { policy } => {
            let ctx = AppContext::with_ollama(config)?;
            to_json(&ctx.index_policy(policy.as_deref())?)
        }
        Commands::Search { query, k } => {
            let ctx = AppContext::with_ollama(config)?;
            to_json(&ctx.search(&query, k)?)
        }
        Commands::Decide {
            application,
            rebuild_if_missing,
        } => {
            let ctx = AppContext::with_ollama(config)?;
            to_json(&ctx.decide(&application.into(), rebuild_if_missing)?)
        }
        Commands::Feedback {
            application,
            response,
            rating,
            correction,
        } => {
            let sink = CsvFeedbackLog::open(config.feedback_log.clone());
            let ctx = AppContext::with_ollama(config)?;
            to_json(&ctx.record_feedback(&sink, &application.into(), &response, rating, correction)?)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| {
        AppError::new("OUTPUT_ENCODE_FAILED", "Failed to encode command result")
            .with_details(e.to_string())
    })
}
