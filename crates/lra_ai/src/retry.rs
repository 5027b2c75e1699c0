use std::thread;
use std::time::Duration;

use lra_core::config::RetryConfig;
use lra_core::error::AppError;

use crate::embeddings::Embedder;
use crate::llm::Llm;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.min(16)).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            initial_backoff: Duration::from_millis(cfg.initial_backoff_ms),
            max_backoff: Duration::from_millis(cfg.max_backoff_ms),
        }
    }
}

/// Boundary decorator: retries retryable upstream errors with exponential backoff.
///
/// Non-retryable errors are returned on first sight. When attempts run out the last error is
/// returned unchanged (still `retryable`), so callers can back off further.
#[derive(Debug, Clone)]
pub struct Retrying<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> Retrying<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    fn run<R>(&self, op: &str, mut call: impl FnMut() -> Result<R, AppError>) -> Result<R, AppError> {
        let mut attempt: u32 = 1;
        loop {
            match call() {
                Ok(v) => return Ok(v),
                Err(e) if e.retryable && attempt < self.policy.max_attempts => {
                    let wait = self.policy.backoff_for(attempt - 1);
                    tracing::warn!(
                        op,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        backoff_ms = wait.as_millis() as u64,
                        code = %e.code,
                        "upstream call failed; retrying"
                    );
                    if !wait.is_zero() {
                        thread::sleep(wait);
                    }
                    attempt += 1;
                }
                Err(e) => {
                    if e.retryable {
                        tracing::warn!(op, attempts = attempt, code = %e.code, "upstream retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl<T: Embedder> Embedder for Retrying<T> {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        self.run("embed", || self.inner.embed(model, input))
    }
}

impl<T: Llm> Llm for Retrying<T> {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError> {
        self.run("generate", || self.inner.generate(model, prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use lra_core::error::UPSTREAM_UNAVAILABLE;

    struct Flaky {
        failures_left: AtomicU32,
        calls: AtomicU32,
        retryable: bool,
    }

    impl Llm for Flaky {
        fn generate(&self, _model: &str, _prompt: &str) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(AppError::new(UPSTREAM_UNAVAILABLE, "down").with_retryable(self.retryable));
            }
            Ok("ok".to_string())
        }
    }

    fn flaky(failures: u32, retryable: bool) -> Flaky {
        Flaky {
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            retryable,
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    #[test]
    fn recovers_after_transient_failures() {
        let llm = Retrying::new(flaky(2, true), policy(3));
        assert_eq!(llm.generate("m", "p").unwrap(), "ok");
        assert_eq!(llm.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn surfaces_last_error_when_attempts_run_out() {
        let llm = Retrying::new(flaky(5, true), policy(3));
        let err = llm.generate("m", "p").unwrap_err();
        assert_eq!(err.code, UPSTREAM_UNAVAILABLE);
        assert!(err.retryable);
        assert_eq!(llm.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn does_not_retry_permanent_errors() {
        let llm = Retrying::new(flaky(1, false), policy(5));
        assert!(llm.generate("m", "p").is_err());
        assert_eq!(llm.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
        };
        assert_eq!(p.backoff_for(0), Duration::from_millis(100));
        assert_eq!(p.backoff_for(1), Duration::from_millis(200));
        assert_eq!(p.backoff_for(2), Duration::from_millis(400));
        assert_eq!(p.backoff_for(3), Duration::from_millis(500));
        assert_eq!(p.backoff_for(40), Duration::from_millis(500));
    }
}
