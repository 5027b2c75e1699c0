use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, INVALID_CONFIGURATION};
use crate::rules::{RuleMode, RulesConfig};

pub const DEFAULT_CONFIG_FILE: &str = "loan-risk-agent.toml";
pub const ENV_PREFIX: &str = "LRA_";

pub const DEFAULT_FORBIDDEN_PHRASES: [&str; 4] = [
    "guarantee returns",
    "hide assets",
    "evade taxes",
    "ignore the regulations",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub embed_model: String,
    pub generate_model: String,
    pub embed_timeout_secs: u64,
    pub generate_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "llama3.1".to_string(),
            embed_timeout_secs: 10,
            generate_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: u32,
    /// Upper bound on policy text placed in one prompt; lower-ranked chunks are evicted whole.
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 6,
            max_context_chars: 8_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 4_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContentPolicyConfig {
    pub forbidden_phrases: Vec<String>,
}

impl Default for ContentPolicyConfig {
    fn default() -> Self {
        Self {
            forbidden_phrases: DEFAULT_FORBIDDEN_PHRASES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub policy_path: PathBuf,
    pub feedback_log: PathBuf,
    pub ollama: OllamaConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub retry: RetryConfig,
    pub rules: RulesConfig,
    pub content_policy: ContentPolicyConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            policy_path: PathBuf::from("data/policy_2025.txt"),
            feedback_log: PathBuf::from("feedback_log.csv"),
            ollama: OllamaConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            retry: RetryConfig::default(),
            rules: RulesConfig::default(),
            content_policy: ContentPolicyConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration: explicit file (must exist), else `loan-risk-agent.toml` in the
    /// working directory when present, else defaults; then `LRA_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::new(INVALID_CONFIGURATION, "Failed to read config file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Self::from_toml_str(&raw).map_err(|e| {
            let details = e.details.clone().unwrap_or_default();
            e.with_details(format!("path={}; {}", path.display(), details))
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        toml::from_str(raw).map_err(|e| {
            AppError::new(INVALID_CONFIGURATION, "Failed to parse config file")
                .with_details(e.to_string())
        })
    }

    /// Apply `LRA_*` overrides. `lookup` is the environment (injected so tests stay hermetic).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = get("DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("POLICY_PATH") {
            self.policy_path = PathBuf::from(v);
        }
        if let Some(v) = get("FEEDBACK_LOG") {
            self.feedback_log = PathBuf::from(v);
        }
        if let Some(v) = get("OLLAMA_BASE_URL") {
            self.ollama.base_url = v;
        }
        if let Some(v) = get("EMBED_MODEL") {
            self.ollama.embed_model = v;
        }
        if let Some(v) = get("GENERATE_MODEL") {
            self.ollama.generate_model = v;
        }
        if let Some(v) = get("CHUNK_SIZE") {
            self.chunking.chunk_size = parse_override("LRA_CHUNK_SIZE", &v)?;
        }
        if let Some(v) = get("CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_override("LRA_CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = get("TOP_K") {
            self.retrieval.top_k = parse_override("LRA_TOP_K", &v)?;
        }
        if let Some(v) = get("RULE_MODE") {
            self.rules.mode = match v.trim().to_lowercase().as_str() {
                "enforce" => RuleMode::Enforce,
                "advisory" => RuleMode::Advisory,
                _ => {
                    return Err(AppError::new(INVALID_CONFIGURATION, "Invalid rule mode override")
                        .with_details(format!("LRA_RULE_MODE={v}")))
                }
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunking.chunk_size == 0 {
            return Err(AppError::new(
                INVALID_CONFIGURATION,
                "chunk_size must be positive",
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AppError::new(
                INVALID_CONFIGURATION,
                "chunk_overlap must be smaller than chunk_size",
            )
            .with_details(format!(
                "chunk_size={}; chunk_overlap={}",
                self.chunking.chunk_size, self.chunking.chunk_overlap
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(AppError::new(INVALID_CONFIGURATION, "top_k must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::new(
                INVALID_CONFIGURATION,
                "retry.max_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

fn parse_override<T: FromStr>(name: &str, raw: &str) -> Result<T, AppError> {
    raw.trim().parse::<T>().map_err(|_| {
        AppError::new(INVALID_CONFIGURATION, "Invalid numeric override")
            .with_details(format!("{name}={raw}"))
    })
}
