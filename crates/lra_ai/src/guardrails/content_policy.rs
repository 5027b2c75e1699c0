use lra_core::config::{ContentPolicyConfig, DEFAULT_FORBIDDEN_PHRASES};
use serde::{Deserialize, Serialize};

pub const SAFE_REASON: &str = "Safe";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVerdict {
    pub is_safe: bool,
    pub reason: String,
}

/// Case-insensitive denylist over model output. Stops at the first phrase found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPolicy {
    phrases: Vec<String>,
}

impl ContentPolicy {
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Self {
        Self {
            phrases: phrases
                .iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn from_config(cfg: &ContentPolicyConfig) -> Self {
        Self::new(cfg.forbidden_phrases.as_slice())
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn validate(&self, text: &str) -> PolicyVerdict {
        let lowered = text.to_lowercase();
        match self.phrases.iter().find(|p| lowered.contains(p.as_str())) {
            Some(phrase) => PolicyVerdict {
                is_safe: false,
                reason: format!("Blocked content detected: '{phrase}'"),
            },
            None => PolicyVerdict {
                is_safe: true,
                reason: SAFE_REASON.to_string(),
            },
        }
    }
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FORBIDDEN_PHRASES.as_slice())
    }
}
