use std::sync::Arc;
use std::thread;

use lra_core::domain::{ApplicationRequest, FeedbackRating, Industry};
use lra_core::feedback::{feedback_record, now_timestamp, CsvFeedbackLog, FeedbackSink, FEEDBACK_HEADER};
use tempfile::tempdir;

fn request() -> ApplicationRequest {
    ApplicationRequest {
        applicant_name: "Harbor Freight, Inc.".to_string(),
        amount_usd: 120_000,
        credit_score: 690,
        industry: Industry::Retail,
        details: "Inventory line of credit, \"seasonal\" stock.".to_string(),
    }
}

fn read_rows(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    rdr.records()
        .map(|r| r.unwrap().iter().map(|s| s.to_string()).collect())
        .collect()
}

#[test]
fn writes_header_once_and_quotes_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs").join("feedback_log.csv");
    let log = CsvFeedbackLog::open(path.clone());

    let req = request();
    log.append(&feedback_record(
        &req,
        "APPROVED, subject to 80% LTV",
        FeedbackRating::Positive,
        None,
        "2026-02-10 09:00:00".to_string(),
    ))
    .unwrap();
    log.append(&feedback_record(
        &req,
        "REJECTED",
        FeedbackRating::Negative,
        Some("Should have been approved; seasonal retail is allowed.".to_string()),
        "2026-02-10 09:05:00".to_string(),
    ))
    .unwrap();

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], FEEDBACK_HEADER.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    assert_eq!(rows[1][1], "Harbor Freight, Inc.");
    assert_eq!(rows[1][2], "120000");
    assert_eq!(rows[1][4], "Inventory line of credit, \"seasonal\" stock.");
    assert_eq!(rows[1][6], "Positive");
    assert_eq!(rows[1][7], "");
    assert_eq!(rows[2][6], "Negative");
    assert_eq!(rows[2][7], "Should have been approved; seasonal retail is allowed.");
}

#[test]
fn concurrent_appends_produce_whole_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("feedback_log.csv");
    let log = Arc::new(CsvFeedbackLog::open(path.clone()));

    let handles = (0..8)
        .map(|i| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for j in 0..10 {
                    let rec = feedback_record(
                        &request(),
                        &format!("decision {i}-{j}"),
                        FeedbackRating::Positive,
                        None,
                        "2026-02-10 09:00:00".to_string(),
                    );
                    log.append(&rec).unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for h in handles {
        h.join().unwrap();
    }

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 81);
    assert_eq!(rows[0][0], "Timestamp");
    assert!(rows[1..].iter().all(|r| r.len() == 8 && r[0] != "Timestamp"));
}

#[test]
fn independent_log_handles_write_one_header() {
    // Separate handles share no mutex, as with separate CLI processes.
    let dir = tempdir().unwrap();
    let path = dir.path().join("feedback_log.csv");

    let handles = (0..6)
        .map(|i| {
            let path = path.clone();
            thread::spawn(move || {
                let log = CsvFeedbackLog::open(path);
                for j in 0..5 {
                    let rec = feedback_record(
                        &request(),
                        &format!("decision {i}-{j} {}", "x".repeat(16 * 1024)),
                        FeedbackRating::Negative,
                        None,
                        "2026-02-10 09:00:00".to_string(),
                    );
                    log.append(&rec).unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for h in handles {
        h.join().unwrap();
    }

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 31);
    assert_eq!(rows.iter().filter(|r| r[0] == "Timestamp").count(), 1);
    assert!(rows[1..].iter().all(|r| r.len() == 8 && r[5].len() > 16 * 1024));
}

#[test]
fn timestamp_has_log_format() {
    let ts = now_timestamp().unwrap();
    assert_eq!(ts.len(), 19);
    assert_eq!(&ts[4..5], "-");
    assert_eq!(&ts[10..11], " ");
    assert_eq!(&ts[13..14], ":");
}
