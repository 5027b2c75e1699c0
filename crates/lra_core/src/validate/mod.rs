use crate::domain::{ApplicationRequest, ValidationIssue};
use crate::error::{AppError, APPLICATION_INVALID};

pub const MIN_COMMERCIAL_AMOUNT_USD: u64 = 5_000;
pub const MIN_CREDIT_SCORE: u16 = 300;
pub const MAX_CREDIT_SCORE: u16 = 850;
pub const MIN_DETAILS_CHARS: usize = 10;
const MIN_NAME_CHARS: usize = 2;

/// Validate an application before any retrieval or generation work begins.
///
/// Every failing rule is reported; an empty list means the request is valid.
pub fn validate_application(req: &ApplicationRequest) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if req.applicant_name.trim().chars().count() < MIN_NAME_CHARS {
        issues.push(ValidationIssue::new(
            "VALIDATION_NAME_REQUIRED",
            "Applicant name is required",
        ));
    }

    if req.amount_usd == 0 {
        issues.push(ValidationIssue::new(
            "VALIDATION_AMOUNT_NOT_POSITIVE",
            "Loan amount must be greater than $0",
        ));
    } else if req.amount_usd < MIN_COMMERCIAL_AMOUNT_USD {
        issues.push(
            ValidationIssue::new(
                "VALIDATION_AMOUNT_BELOW_MINIMUM",
                "Minimum loan amount is $5,000 for commercial processing",
            )
            .with_details(format!("amount_usd={}", req.amount_usd)),
        );
    }

    if !(MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&req.credit_score) {
        issues.push(
            ValidationIssue::new(
                "VALIDATION_CREDIT_SCORE_RANGE",
                "Credit score must be between 300 and 850",
            )
            .with_details(format!("credit_score={}", req.credit_score)),
        );
    }

    if req.details.trim().chars().count() < MIN_DETAILS_CHARS {
        issues.push(ValidationIssue::new(
            "VALIDATION_DETAILS_TOO_SHORT",
            "Loan purpose details must be at least 10 characters",
        ));
    }

    issues
}

pub fn ensure_valid_application(req: &ApplicationRequest) -> Result<(), AppError> {
    let issues = validate_application(req);
    if issues.is_empty() {
        return Ok(());
    }
    let codes = issues
        .iter()
        .map(|i| i.code.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let messages = issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    Err(
        AppError::new(APPLICATION_INVALID, "Application failed validation")
            .with_details(format!("codes={codes}; {messages}")),
    )
}
