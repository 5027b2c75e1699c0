use std::time::Duration;

use lra_core::error::{AppError, UPSTREAM_UNAVAILABLE};

const LOOPBACK_PREFIX: &str = "http://127.0.0.1";

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    embed_timeout: Duration,
    generate_timeout: Duration,
}

impl OllamaClient {
    /// Create a client for Ollama. This is strictly limited to `127.0.0.1`: applicant data
    /// never leaves the host.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        validate_loopback_url(&base_url)?;
        Ok(Self {
            base_url,
            embed_timeout: Duration::from_secs(10),
            generate_timeout: Duration::from_secs(60),
        })
    }

    pub fn with_timeouts(mut self, embed: Duration, generate: Duration) -> Self {
        self.embed_timeout = embed;
        self.generate_timeout = generate;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn embed_timeout(&self) -> Duration {
        self.embed_timeout
    }

    pub fn generate_timeout(&self) -> Duration {
        self.generate_timeout
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url).timeout(Duration::from_millis(800)).call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(AppError::new("AI_OLLAMA_UNHEALTHY", "Ollama health check failed")
                .with_details(format!("status={}", r.status()))),
            Err(ureq::Error::Status(code, _)) => Err(AppError::new(
                "AI_OLLAMA_UNHEALTHY",
                "Ollama health check failed",
            )
            .with_details(format!("status={code}"))),
            Err(e) => Err(AppError::new(
                UPSTREAM_UNAVAILABLE,
                "Failed to reach Ollama on 127.0.0.1",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}

fn validate_loopback_url(base_url: &str) -> Result<(), AppError> {
    let reject = || {
        AppError::new(
            "AI_REMOTE_NOT_ALLOWED",
            "Ollama base URL must be localhost (127.0.0.1)",
        )
        .with_details(format!("base_url={base_url}"))
    };

    let rest = base_url.strip_prefix(LOOPBACK_PREFIX).ok_or_else(reject)?;
    if rest.is_empty() {
        return Ok(());
    }
    // Only an explicit port may follow the host: no path, userinfo or longer host names.
    let port = rest.strip_prefix(':').ok_or_else(reject)?;
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(reject());
    }
    match port.parse::<u32>() {
        Ok(p) if (1..=65_535).contains(&p) => Ok(()),
        _ => Err(reject()),
    }
}

/// Map a ureq failure onto the workspace error taxonomy.
///
/// Transport failures, 429 and 5xx are `UPSTREAM_UNAVAILABLE` and retryable; any other status
/// is reported under `code` and is not retried.
pub(crate) fn upstream_error(code: &str, what: &str, err: ureq::Error) -> AppError {
    match err {
        ureq::Error::Status(status, _) if status == 429 || status >= 500 => {
            AppError::new(UPSTREAM_UNAVAILABLE, format!("{what} endpoint unavailable"))
                .with_details(format!("status={status}"))
                .with_retryable(true)
        }
        ureq::Error::Status(status, _) => AppError::new(code, format!("{what} request failed"))
            .with_details(format!("status={status}")),
        ureq::Error::Transport(t) => {
            AppError::new(UPSTREAM_UNAVAILABLE, format!("Failed to call {what} endpoint"))
                .with_details(t.to_string())
                .with_retryable(true)
        }
    }
}
