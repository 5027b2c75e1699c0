use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{ApplicationRequest, Industry};
use crate::error::{AppError, INVALID_CONFIGURATION};

pub const RULE_PROHIBITED_INDUSTRY: &str = "PROHIBITED_INDUSTRY";
pub const RULE_PROHIBITED_ACTIVITY: &str = "PROHIBITED_ACTIVITY";
pub const RULE_BUSINESS_AGE: &str = "BUSINESS_AGE";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    /// Hard-stop findings decide the application without consulting the model.
    #[default]
    Enforce,
    /// Findings are only handed to the model as pre-screen context.
    Advisory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RulesConfig {
    pub mode: RuleMode,
    pub prohibited_industries: Vec<Industry>,
    pub prohibited_activity_keywords: Vec<String>,
    pub new_business_keywords: Vec<String>,
    /// Phrases that often, but not always, describe a young business. They produce non-blocking
    /// findings that the model weighs against the rest of the application.
    pub possible_new_business_keywords: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            mode: RuleMode::Enforce,
            prohibited_industries: vec![Industry::CryptoMining, Industry::CasinoGambling],
            prohibited_activity_keywords: [
                "crypto",
                "cryptocurrency",
                "bitcoin",
                "mining rig",
                "mining rigs",
                "casino",
                "gambling",
                "sports betting",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            new_business_keywords: [
                "startup",
                "start-up",
                "new business",
                "just opened",
                "newly formed",
                "newly founded",
                "recently founded",
                "pre-revenue",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            possible_new_business_keywords: ["brand-new", "brand new", "opening"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleFinding {
    pub rule: String,
    pub message: String,
    /// The keyword or field value that triggered the rule.
    pub evidence: Option<String>,
    pub hard_stop: bool,
}

/// Deterministic pre-screen evaluated before the model is consulted.
///
/// The findings are a floor, not a complete policy: an application with no findings still goes
/// through retrieval and the model's review.
#[derive(Debug, Clone)]
pub struct RuleSet {
    mode: RuleMode,
    prohibited_industries: Vec<Industry>,
    activity: Option<Regex>,
    business_age: Option<Regex>,
    possible_business_age: Option<Regex>,
}

impl RuleSet {
    pub fn from_config(cfg: &RulesConfig) -> Result<Self, AppError> {
        Ok(Self {
            mode: cfg.mode,
            prohibited_industries: cfg.prohibited_industries.clone(),
            activity: keyword_regex(&cfg.prohibited_activity_keywords)?,
            business_age: keyword_regex(&cfg.new_business_keywords)?,
            possible_business_age: keyword_regex(&cfg.possible_new_business_keywords)?,
        })
    }

    pub fn mode(&self) -> RuleMode {
        self.mode
    }

    pub fn evaluate(&self, req: &ApplicationRequest) -> Vec<RuleFinding> {
        let mut findings = Vec::new();

        if self.prohibited_industries.contains(&req.industry) {
            findings.push(RuleFinding {
                rule: RULE_PROHIBITED_INDUSTRY.to_string(),
                message: format!("Industry '{}' is on the prohibited list", req.industry),
                evidence: Some(req.industry.label().to_string()),
                hard_stop: true,
            });
        }

        if let Some(kw) = first_keyword(self.activity.as_ref(), &req.details) {
            findings.push(RuleFinding {
                rule: RULE_PROHIBITED_ACTIVITY.to_string(),
                message: "Details describe a prohibited business activity".to_string(),
                evidence: Some(kw),
                hard_stop: true,
            });
        }

        if let Some(kw) = first_keyword(self.business_age.as_ref(), &req.details) {
            findings.push(RuleFinding {
                rule: RULE_BUSINESS_AGE.to_string(),
                message: "Details imply the business is less than 2 years old".to_string(),
                evidence: Some(kw),
                hard_stop: true,
            });
        } else if let Some(kw) =
            first_keyword(self.possible_business_age.as_ref(), &req.details)
        {
            findings.push(RuleFinding {
                rule: RULE_BUSINESS_AGE.to_string(),
                message: "Details may describe a business under 2 years old; confirm its history"
                    .to_string(),
                evidence: Some(kw),
                hard_stop: false,
            });
        }

        findings
    }
}

fn keyword_regex(keywords: &[String]) -> Result<Option<Regex>, AppError> {
    let alternatives = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>();
    if alternatives.is_empty() {
        return Ok(None);
    }
    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
    Regex::new(&pattern).map(Some).map_err(|e| {
        AppError::new(INVALID_CONFIGURATION, "Invalid rule keyword list")
            .with_details(e.to_string())
    })
}

fn first_keyword(re: Option<&Regex>, text: &str) -> Option<String> {
    re?.find(text).map(|m| m.as_str().to_lowercase())
}
