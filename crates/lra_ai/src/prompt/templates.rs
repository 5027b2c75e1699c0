pub const PERSONA: &str = "You are a Senior Commercial Credit Officer at ACME Banking.\n\
Your goal is to assess loan applications strictly based on the BANK POLICY provided below.";

pub const NO_RULE_ANSWER: &str = "I cannot find a rule regarding this in the policy.";

pub fn decision_prompt(policy_blocks: &str, application_block: &str, findings_block: &str) -> String {
    // Contract kept explicit in the prompt:
    // - policy text is the only authority
    // - REJECTED must quote the rule it relies on
    format!(
        r#"{PERSONA}

<BANK_POLICY>
{policy_blocks}
</BANK_POLICY>

<APPLICATION>
{application_block}
</APPLICATION>

<PRESCREEN_FINDINGS>
{findings_block}
</PRESCREEN_FINDINGS>

INSTRUCTIONS:
1) Industries: check whether the policy prohibits the applicant's industry or described activity.
2) Business age: check whether the Details imply the business is less than 2 years old (e.g. "Startup", "New business", "Just opened"). If yes, REJECT. Words like "opening" or "brand new" alone do not make a business young; weigh (advisory) findings against the stated operating history.
3) Limits and collateral: check the requested amount, credit score and any collateral ratios against the policy limits.
4) If the policy explicitly forbids the loan, say "REJECTED" and quote the specific rule, citing its [[policy:<n>]] tag.
5) If the policy allows it but requires specific conditions (like LTV), state them.
6) If the answer is not in the policy, say "{NO_RULE_ANSWER}"
7) Pre-screen findings are a floor, not a complete review. Be professional, concise and direct.
"#
    )
}
