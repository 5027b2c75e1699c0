use lra_ai::policy::Chunk;
use lra_ai::prompt::{build_decision_prompt, ContextBudget, NO_RULE_ANSWER};
use lra_ai::retrieve::RetrievedChunk;
use lra_core::domain::{ApplicationRequest, Industry};
use lra_core::rules::RuleFinding;
use pretty_assertions::assert_eq;

fn hit(ordinal: u32, text: &str, rank: u32) -> RetrievedChunk {
    RetrievedChunk {
        chunk: Chunk {
            source_id: "policy_2025.txt".to_string(),
            ordinal,
            start_offset: ordinal as usize * 100,
            length: text.chars().count(),
            text: text.to_string(),
            text_sha256: format!("sha-{ordinal}"),
        },
        score: 1.0 - rank as f32 * 0.1,
        distance: rank as f32 * 0.1,
        rank,
    }
}

fn application() -> ApplicationRequest {
    ApplicationRequest {
        applicant_name: "Acme Tooling LLC".to_string(),
        amount_usd: 250_000,
        credit_score: 720,
        industry: Industry::Manufacturing,
        details: "Expansion of a 12 year old machine shop".to_string(),
    }
}

#[test]
fn sections_appear_in_order_with_verbatim_policy_text() {
    let retrieved = vec![
        hit(3, "SECTION 3: Maximum loan-to-value is 80%.", 1),
        hit(0, "SECTION 1: Crypto mining is prohibited.", 2),
    ];
    let p = build_decision_prompt(&retrieved, &application(), &[], &ContextBudget::default());

    let persona = p.text.find("Senior Commercial Credit Officer at ACME Banking").expect("persona");
    let policy = p.text.find("<BANK_POLICY>").expect("policy open");
    let policy_end = p.text.find("</BANK_POLICY>").expect("policy close");
    let app = p.text.find("<APPLICATION>").expect("application");
    let findings = p.text.find("<PRESCREEN_FINDINGS>").expect("findings");
    let instructions = p.text.find("INSTRUCTIONS:").expect("instructions");
    assert!(persona < policy && policy < policy_end && policy_end < app);
    assert!(app < findings && findings < instructions);

    let policy_block = &p.text[policy..policy_end];
    assert!(policy_block.contains("[[policy:3]]\nSECTION 3: Maximum loan-to-value is 80%."));
    assert!(policy_block.contains("[[policy:0]]\nSECTION 1: Crypto mining is prohibited."));
    assert!(policy_block.find("[[policy:3]]") < policy_block.find("[[policy:0]]"));

    assert!(p.text.contains("- Loan Amount: $250,000"));
    assert!(p.text.contains("- Credit Score: 720"));
    assert!(p.text.contains("- Industry: Manufacturing"));
    assert!(p.text.contains("less than 2 years old"));
    assert!(p.text.contains("say \"REJECTED\" and quote the specific rule"));
    assert!(p.text.contains(NO_RULE_ANSWER));
    assert!(p.evicted.is_empty());
    assert_eq!(p.included.len(), 2);
}

#[test]
fn budget_evicts_whole_lower_ranked_chunks() {
    let retrieved = vec![
        hit(5, &"x".repeat(60), 1),
        hit(1, &"y".repeat(30), 2),
        hit(2, &"z".repeat(30), 3),
        hit(7, "w", 4),
    ];
    let budget = ContextBudget {
        max_context_chars: 100,
    };
    let p = build_decision_prompt(&retrieved, &application(), &[], &budget);

    assert_eq!(
        p.included.iter().map(|r| r.chunk.ordinal).collect::<Vec<_>>(),
        vec![5, 1]
    );
    // Prefix rule: once a chunk is evicted, nothing after it is kept.
    assert_eq!(p.evicted, vec![2, 7]);
    assert!(p.text.contains(&"y".repeat(30)));
    assert!(!p.text.contains(&"z".repeat(30)));
    assert!(!p.text.contains("[[policy:7]]"));
}

#[test]
fn top_chunk_is_kept_even_over_budget() {
    let retrieved = vec![hit(4, &"q".repeat(500), 1), hit(6, "short", 2)];
    let p = build_decision_prompt(
        &retrieved,
        &application(),
        &[],
        &ContextBudget {
            max_context_chars: 10,
        },
    );
    assert_eq!(p.included.len(), 1);
    assert!(p.text.contains(&"q".repeat(500)));
    assert_eq!(p.evicted, vec![6]);
}

#[test]
fn findings_are_listed_with_evidence() {
    let findings = vec![RuleFinding {
        rule: "BUSINESS_AGE".to_string(),
        message: "Details imply the business is less than 2 years old".to_string(),
        evidence: Some("startup".to_string()),
        hard_stop: true,
    }];
    let p = build_decision_prompt(&[], &application(), &findings, &ContextBudget::default());
    assert!(p.text.contains(
        "- BUSINESS_AGE: Details imply the business is less than 2 years old (evidence: \"startup\")"
    ));
    assert!(p.text.contains("(no policy context retrieved)"));

    let advisory = vec![RuleFinding {
        rule: "BUSINESS_AGE".to_string(),
        message: "Details may describe a business under 2 years old".to_string(),
        evidence: Some("opening".to_string()),
        hard_stop: false,
    }];
    let p = build_decision_prompt(&[], &application(), &advisory, &ContextBudget::default());
    assert!(p.text.contains("- BUSINESS_AGE (advisory): Details may describe"));

    let none = build_decision_prompt(&[], &application(), &[], &ContextBudget::default());
    assert!(none.text.contains("<PRESCREEN_FINDINGS>\n(none)\n</PRESCREEN_FINDINGS>"));
}
