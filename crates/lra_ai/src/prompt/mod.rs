use lra_core::domain::ApplicationRequest;
use lra_core::rules::RuleFinding;
use serde::{Deserialize, Serialize};

use crate::retrieve::RetrievedChunk;

mod templates;

pub use templates::NO_RULE_ANSWER;

/// Max-context policy: how much retrieved policy text one prompt may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBudget {
    pub max_context_chars: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_context_chars: 8_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPrompt {
    pub text: String,
    /// Chunks embedded verbatim, in similarity order.
    pub included: Vec<RetrievedChunk>,
    /// Ordinals dropped by the context budget.
    pub evicted: Vec<u32>,
}

/// Assemble the decision prompt. Pure; no I/O.
///
/// Eviction keeps the longest similarity-ordered prefix whose combined text fits the budget.
/// The top-ranked chunk is always kept, and a chunk is either included whole or evicted whole.
pub fn build_decision_prompt(
    retrieved: &[RetrievedChunk],
    req: &ApplicationRequest,
    findings: &[RuleFinding],
    budget: &ContextBudget,
) -> DecisionPrompt {
    let mut included: Vec<RetrievedChunk> = Vec::new();
    let mut evicted: Vec<u32> = Vec::new();
    let mut used = 0usize;
    for (i, rc) in retrieved.iter().enumerate() {
        let len = rc.chunk.length;
        if i == 0 || (evicted.is_empty() && used + len <= budget.max_context_chars) {
            used += len;
            included.push(rc.clone());
        } else {
            evicted.push(rc.chunk.ordinal);
        }
    }

    let policy_blocks = if included.is_empty() {
        "(no policy context retrieved)".to_string()
    } else {
        included
            .iter()
            .map(|rc| format!("[[policy:{}]]\n{}", rc.chunk.ordinal, rc.chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    };

    let text = templates::decision_prompt(
        &policy_blocks,
        &application_block(req),
        &findings_block(findings),
    );

    DecisionPrompt {
        text,
        included,
        evicted,
    }
}

fn application_block(req: &ApplicationRequest) -> String {
    format!(
        "- Company: {}\n- Industry: {}\n- Loan Amount: ${}\n- Credit Score: {}\n- Details: {}",
        req.applicant_name.trim(),
        req.industry,
        format_usd(req.amount_usd),
        req.credit_score,
        req.details.trim()
    )
}

fn findings_block(findings: &[RuleFinding]) -> String {
    if findings.is_empty() {
        return "(none)".to_string();
    }
    findings
        .iter()
        .map(|f| {
            let tag = if f.hard_stop { "" } else { " (advisory)" };
            match &f.evidence {
                Some(ev) => format!("- {}{}: {} (evidence: \"{}\")", f.rule, tag, f.message, ev),
                None => format!("- {}{}: {}", f.rule, tag, f.message),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `90000` -> `90,000`.
pub fn format_usd(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::format_usd;

    #[test]
    fn formats_thousands() {
        assert_eq!(format_usd(0), "0");
        assert_eq!(format_usd(999), "999");
        assert_eq!(format_usd(90_000), "90,000");
        assert_eq!(format_usd(1_250_000), "1,250,000");
    }
}
