use std::sync::LazyLock;

use lra_core::error::{AppError, INVALID_CONFIGURATION};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const CATEGORY_SSN: &str = "SSN";
pub const CATEGORY_EMAIL: &str = "Email";
pub const CATEGORY_PHONE: &str = "Phone";

static SSN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{3}-[0-9]{2}-[0-9]{4}\b").expect("ssn pattern"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern")
});
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?\b1[-. ]?)?(?:\([0-9]{3}\)|\b[0-9]{3})[-. ]?[0-9]{3}[-. ]?[0-9]{4}\b")
        .expect("phone pattern")
});

/// Byte range of one detected occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiiMatch {
    pub start: usize,
    pub end: usize,
}

/// One PII category. Placeholders must not themselves match any detector.
pub trait Detector: Send + Sync {
    fn category(&self) -> &str;
    fn placeholder(&self) -> &str;
    fn find(&self, text: &str) -> Vec<PiiMatch>;
}

#[derive(Debug, Clone)]
pub struct RegexDetector {
    category: String,
    placeholder: String,
    re: Regex,
}

impl RegexDetector {
    pub fn new(category: &str, placeholder: &str, pattern: &str) -> Result<Self, AppError> {
        let re = Regex::new(pattern).map_err(|e| {
            AppError::new(INVALID_CONFIGURATION, "Invalid PII detector pattern")
                .with_details(format!("category={category}; err={e}"))
        })?;
        Ok(Self::from_regex(category, placeholder, re))
    }

    fn from_regex(category: &str, placeholder: &str, re: Regex) -> Self {
        Self {
            category: category.to_string(),
            placeholder: placeholder.to_string(),
            re,
        }
    }

    pub fn ssn() -> Self {
        Self::from_regex(CATEGORY_SSN, "[SSN_REDACTED]", SSN_RE.clone())
    }

    pub fn email() -> Self {
        Self::from_regex(CATEGORY_EMAIL, "[EMAIL_REDACTED]", EMAIL_RE.clone())
    }

    pub fn phone() -> Self {
        Self::from_regex(CATEGORY_PHONE, "[PHONE_REDACTED]", PHONE_RE.clone())
    }
}

impl Detector for RegexDetector {
    fn category(&self) -> &str {
        &self.category
    }

    fn placeholder(&self) -> &str {
        &self.placeholder
    }

    fn find(&self, text: &str) -> Vec<PiiMatch> {
        self.re
            .find_iter(text)
            .map(|m| PiiMatch {
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }
}

/// SSN, Email, Phone, in that order.
pub fn default_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(RegexDetector::ssn()),
        Box::new(RegexDetector::email()),
        Box::new(RegexDetector::phone()),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionResult {
    pub clean_text: String,
    /// Categories that fired, in detector order. Empty iff nothing was replaced.
    pub detected_categories: Vec<String>,
}

/// Replace every match with `placeholder`. Overlapping or unordered matches are tolerated.
///
/// Offsets that fall inside a multi-byte character are widened to cover the whole character.
pub(crate) fn redact(text: &str, matches: &[PiiMatch], placeholder: &str) -> String {
    let mut sorted = matches
        .iter()
        .filter(|m| m.end > m.start && m.end <= text.len())
        .map(|m| PiiMatch {
            start: floor_char_boundary(text, m.start),
            end: ceil_char_boundary(text, m.end),
        })
        .collect::<Vec<_>>();
    sorted.sort_by_key(|m| (m.start, m.end));

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for m in sorted {
        if m.start < cursor {
            continue;
        }
        out.push_str(&text[cursor..m.start]);
        out.push_str(placeholder);
        cursor = m.end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, mut i: usize) -> usize {
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}
