pub mod config;
pub mod domain;
pub mod error;
pub mod feedback;
pub mod rules;
pub mod validate;

#[cfg(test)]
mod tests {
    use super::error::{AppError, UPSTREAM_UNAVAILABLE};

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new(UPSTREAM_UNAVAILABLE, "model endpoint unreachable")
            .with_details("status=503")
            .with_retryable(true);
        assert_eq!(err.code, "UPSTREAM_UNAVAILABLE");
        assert_eq!(err.message, "model endpoint unreachable");
        assert_eq!(err.details.as_deref(), Some("status=503"));
        assert!(err.retryable);
        assert!(err.is(UPSTREAM_UNAVAILABLE));
        assert_eq!(err.to_string(), "[UPSTREAM_UNAVAILABLE] model endpoint unreachable");
    }
}
