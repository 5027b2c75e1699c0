use lra_core::config::ContentPolicyConfig;

mod content_policy;
mod pii;

pub use content_policy::{ContentPolicy, PolicyVerdict, SAFE_REASON};
pub use pii::{
    default_detectors, Detector, PiiMatch, RedactionResult, RegexDetector, CATEGORY_EMAIL,
    CATEGORY_PHONE, CATEGORY_SSN,
};

const MAX_SCRUB_PASSES: usize = 16;

/// Input scrubbing and output content screening around the model call.
///
/// Both operations are total: they never fail and never touch shared state.
pub struct PiiGuard {
    detectors: Vec<Box<dyn Detector>>,
    policy: ContentPolicy,
}

impl PiiGuard {
    pub fn new(detectors: Vec<Box<dyn Detector>>, policy: ContentPolicy) -> Self {
        Self { detectors, policy }
    }

    pub fn from_config(cfg: &ContentPolicyConfig) -> Self {
        Self::new(default_detectors(), ContentPolicy::from_config(cfg))
    }

    pub fn categories(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.category()).collect()
    }

    /// Redact every detector's matches, repeating until a full pass finds nothing.
    pub fn scrub(&self, text: &str) -> RedactionResult {
        let mut clean = text.to_string();
        let mut fired = vec![false; self.detectors.len()];

        for pass in 0.. {
            let mut changed = false;
            for (i, d) in self.detectors.iter().enumerate() {
                let matches = d.find(&clean);
                if matches.is_empty() {
                    continue;
                }
                let redacted = pii::redact(&clean, &matches, d.placeholder());
                if redacted == clean {
                    continue;
                }
                clean = redacted;
                fired[i] = true;
                changed = true;
            }
            if !changed {
                break;
            }
            if pass + 1 >= MAX_SCRUB_PASSES {
                tracing::warn!(passes = MAX_SCRUB_PASSES, "pii scrub did not settle");
                break;
            }
        }

        let detected_categories = self
            .detectors
            .iter()
            .zip(fired)
            .filter(|(_, hit)| *hit)
            .map(|(d, _)| d.category().to_string())
            .collect::<Vec<_>>();

        if !detected_categories.is_empty() {
            tracing::debug!(categories = ?detected_categories, "pii redacted");
        }

        RedactionResult {
            clean_text: clean,
            detected_categories,
        }
    }

    pub fn validate_content_policy(&self, text: &str) -> PolicyVerdict {
        self.policy.validate(text)
    }
}

impl Default for PiiGuard {
    fn default() -> Self {
        Self::new(default_detectors(), ContentPolicy::default())
    }
}

impl std::fmt::Debug for PiiGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiiGuard")
            .field("detectors", &self.categories())
            .field("policy", &self.policy)
            .finish()
    }
}
