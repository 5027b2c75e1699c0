use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, INVALID_CONFIGURATION};

/// Industry categories offered on the application form.
///
/// Serialized by display label (`"Crypto/Mining"`), which is also what the bank policy text
/// and the model prompt use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Industry {
    Manufacturing,
    Retail,
    #[serde(rename = "Real Estate")]
    RealEstate,
    #[serde(rename = "Crypto/Mining")]
    CryptoMining,
    #[serde(rename = "Casino/Gambling")]
    CasinoGambling,
    Technology,
    Other,
}

impl Industry {
    pub const ALL: [Industry; 7] = [
        Industry::Manufacturing,
        Industry::Retail,
        Industry::RealEstate,
        Industry::CryptoMining,
        Industry::CasinoGambling,
        Industry::Technology,
        Industry::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Industry::Manufacturing => "Manufacturing",
            Industry::Retail => "Retail",
            Industry::RealEstate => "Real Estate",
            Industry::CryptoMining => "Crypto/Mining",
            Industry::CasinoGambling => "Casino/Gambling",
            Industry::Technology => "Technology",
            Industry::Other => "Other",
        }
    }

    fn snake_name(self) -> &'static str {
        match self {
            Industry::Manufacturing => "manufacturing",
            Industry::Retail => "retail",
            Industry::RealEstate => "real_estate",
            Industry::CryptoMining => "crypto_mining",
            Industry::CasinoGambling => "casino_gambling",
            Industry::Technology => "technology",
            Industry::Other => "other",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Industry {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Industry::ALL
            .iter()
            .copied()
            .find(|i| i.label().to_lowercase() == wanted || i.snake_name() == wanted)
            .ok_or_else(|| {
                AppError::new(INVALID_CONFIGURATION, "Unknown industry")
                    .with_details(format!("industry={s}"))
            })
    }
}

/// A single loan application under review. Transient: lives for one decision cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationRequest {
    pub applicant_name: String,
    pub amount_usd: u64,
    pub credit_score: u16,
    pub industry: Industry,
    /// Free-text purpose, use of funds and collateral. May contain PII until scrubbed.
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl ValidationIssue {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FeedbackRating {
    Positive,
    Negative,
}

impl FeedbackRating {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackRating::Positive => "Positive",
            FeedbackRating::Negative => "Negative",
        }
    }
}

impl FromStr for FeedbackRating {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "correct" | "up" => Ok(FeedbackRating::Positive),
            "negative" | "incorrect" | "down" => Ok(FeedbackRating::Negative),
            _ => Err(AppError::new(INVALID_CONFIGURATION, "Unknown feedback rating")
                .with_details(format!("rating={s}"))),
        }
    }
}

/// One human rating of a decision, as appended to the feedback log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub timestamp: String,
    pub applicant: String,
    pub amount_usd: u64,
    pub credit_score: u16,
    pub details: String,
    pub ai_response: String,
    pub rating: FeedbackRating,
    pub correction: Option<String>,
}
