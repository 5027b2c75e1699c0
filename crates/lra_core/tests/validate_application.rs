use lra_core::domain::{ApplicationRequest, Industry};
use lra_core::validate::{ensure_valid_application, validate_application};

fn valid_request() -> ApplicationRequest {
    ApplicationRequest {
        applicant_name: "Acme Tooling LLC".to_string(),
        amount_usd: 250_000,
        credit_score: 720,
        industry: Industry::Manufacturing,
        details: "Purchase of a CNC machine, secured by the equipment itself.".to_string(),
    }
}

fn codes(req: &ApplicationRequest) -> Vec<String> {
    validate_application(req).into_iter().map(|i| i.code).collect()
}

#[test]
fn valid_request_has_no_issues() {
    assert!(validate_application(&valid_request()).is_empty());
    assert!(ensure_valid_application(&valid_request()).is_ok());
}

#[test]
fn collects_every_issue_not_just_the_first() {
    let req = ApplicationRequest {
        applicant_name: " A ".to_string(),
        amount_usd: 0,
        credit_score: 900,
        industry: Industry::Other,
        details: "short".to_string(),
    };
    assert_eq!(
        codes(&req),
        vec![
            "VALIDATION_NAME_REQUIRED",
            "VALIDATION_AMOUNT_NOT_POSITIVE",
            "VALIDATION_CREDIT_SCORE_RANGE",
            "VALIDATION_DETAILS_TOO_SHORT",
        ]
    );

    let err = ensure_valid_application(&req).unwrap_err();
    assert_eq!(err.code, "APPLICATION_INVALID");
    assert!(err.details.unwrap().contains("VALIDATION_CREDIT_SCORE_RANGE"));
}

#[test]
fn amount_below_commercial_minimum_is_rejected() {
    let mut req = valid_request();
    req.amount_usd = 4_999;
    assert_eq!(codes(&req), vec!["VALIDATION_AMOUNT_BELOW_MINIMUM"]);
    req.amount_usd = 5_000;
    assert!(codes(&req).is_empty());
}

#[test]
fn credit_score_bounds_are_inclusive() {
    let mut req = valid_request();
    for ok in [300u16, 850] {
        req.credit_score = ok;
        assert!(codes(&req).is_empty(), "score {ok} should be valid");
    }
    for bad in [0u16, 299, 851] {
        req.credit_score = bad;
        assert_eq!(codes(&req), vec!["VALIDATION_CREDIT_SCORE_RANGE"]);
    }
}

#[test]
fn details_length_ignores_surrounding_whitespace() {
    let mut req = valid_request();
    req.details = "    123456789    ".to_string();
    assert_eq!(codes(&req), vec!["VALIDATION_DETAILS_TOO_SHORT"]);
    req.details = "1234567890".to_string();
    assert!(codes(&req).is_empty());
}
