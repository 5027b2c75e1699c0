pub mod embeddings;
pub mod guardrails;
pub mod llm;
pub mod ollama;
pub mod pipeline;
pub mod policy;
pub mod prompt;
pub mod retrieve;
pub mod retry;

#[cfg(test)]
mod tests {
    use super::guardrails::PiiGuard;
    use super::ollama::OllamaClient;

    #[test]
    fn enforces_localhost_only_base_url() {
        assert!(OllamaClient::new("http://127.0.0.1:11434").is_ok());
        assert!(OllamaClient::new("http://127.0.0.1").is_ok());

        assert!(OllamaClient::new("http://localhost:11434").is_err());
        assert!(OllamaClient::new("http://0.0.0.0:11434").is_err());
        assert!(OllamaClient::new("http://[::1]:11434").is_err());
        assert!(OllamaClient::new("https://bedrock.us-east-1.amazonaws.com").is_err());

        // Prefix-based bypasses.
        assert!(OllamaClient::new("http://127.0.0.1.evil.com:11434").is_err());
        assert!(OllamaClient::new("http://127.0.0.1@evil.com:11434").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:0").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:99999").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:11434/").is_ok()); // trailing slash is trimmed
        assert!(OllamaClient::new("http://127.0.0.1:11434/api").is_err());
    }

    #[test]
    fn remote_url_error_code() {
        let err = OllamaClient::new("http://10.0.0.5:11434").unwrap_err();
        assert_eq!(err.code, "AI_REMOTE_NOT_ALLOWED");
    }

    #[test]
    fn default_guard_declares_categories_in_order() {
        assert_eq!(PiiGuard::default().categories(), vec!["SSN", "Email", "Phone"]);
    }
}
