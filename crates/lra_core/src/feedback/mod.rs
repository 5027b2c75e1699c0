use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use time::{format_description, OffsetDateTime};

use crate::domain::{ApplicationRequest, FeedbackRating, FeedbackRecord};
use crate::error::AppError;

pub const FEEDBACK_HEADER: [&str; 8] = [
    "Timestamp",
    "Applicant",
    "Loan_Amount",
    "Credit_Score",
    "Details",
    "AI_Response",
    "Rating",
    "Human_Correction",
];

/// Destination for human ratings of decisions.
pub trait FeedbackSink: Send + Sync {
    fn append(&self, record: &FeedbackRecord) -> Result<(), AppError>;
}

/// Append-only CSV log.
///
/// Appends are serialized by a mutex within the process and by an exclusive advisory lock on
/// the log file across processes. Each row goes out in a single write.
#[derive(Debug)]
pub struct CsvFeedbackLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvFeedbackLog {
    pub fn open(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

impl FeedbackSink for CsvFeedbackLog {
    fn append(&self, record: &FeedbackRecord) -> Result<(), AppError> {
        let _guard = self.lock.lock().map_err(|_| {
            AppError::new("FEEDBACK_LOG_FAILED", "Feedback log lock poisoned")
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::new("FEEDBACK_LOG_FAILED", "Failed to create feedback log directory")
                    .with_details(format!("path={}; err={}", parent.display(), e))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                AppError::new("FEEDBACK_LOG_FAILED", "Failed to open feedback log")
                    .with_details(format!("path={}; err={}", self.path.display(), e))
            })?;
        FileExt::lock_exclusive(&file).map_err(|e| {
            AppError::new("FEEDBACK_LOG_FAILED", "Failed to lock feedback log")
                .with_details(format!("path={}; err={}", self.path.display(), e))
        })?;

        // Checked under the file lock so only one writer ever adds the header.
        let written = file.metadata().map(|m| m.len() > 0);
        let result = written
            .map_err(|e| {
                AppError::new("FEEDBACK_LOG_FAILED", "Failed to stat feedback log")
                    .with_details(e.to_string())
            })
            .and_then(|written| encode_rows(record, !written))
            .and_then(|bytes| {
                file.write_all(&bytes).and_then(|_| file.flush()).map_err(|e| {
                    AppError::new("FEEDBACK_LOG_FAILED", "Failed to write feedback row")
                        .with_details(e.to_string())
                })
            });
        let _ = FileExt::unlock(&file);
        result?;

        tracing::debug!(rating = record.rating.as_str(), "feedback appended");
        Ok(())
    }
}

fn encode_rows(record: &FeedbackRecord, with_header: bool) -> Result<Vec<u8>, AppError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if with_header {
        wtr.write_record(FEEDBACK_HEADER).map_err(write_err)?;
    }
    let amount = record.amount_usd.to_string();
    let score = record.credit_score.to_string();
    wtr.write_record([
        record.timestamp.as_str(),
        record.applicant.as_str(),
        amount.as_str(),
        score.as_str(),
        record.details.as_str(),
        record.ai_response.as_str(),
        record.rating.as_str(),
        record.correction.as_deref().unwrap_or(""),
    ])
    .map_err(write_err)?;
    wtr.into_inner().map_err(|e| {
        AppError::new("FEEDBACK_LOG_FAILED", "Failed to encode feedback row")
            .with_details(e.to_string())
    })
}

fn write_err(e: csv::Error) -> AppError {
    AppError::new("FEEDBACK_LOG_FAILED", "Failed to write feedback row").with_details(e.to_string())
}

/// Current UTC time as `YYYY-MM-DD HH:MM:SS`, the feedback log's timestamp column format.
pub fn now_timestamp() -> Result<String, AppError> {
    let fmt = format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
        .map_err(|e| {
            AppError::new("FEEDBACK_LOG_FAILED", "Invalid timestamp format").with_details(e.to_string())
        })?;
    OffsetDateTime::now_utc().format(&fmt).map_err(|e| {
        AppError::new("FEEDBACK_LOG_FAILED", "Failed to format time").with_details(e.to_string())
    })
}

pub fn feedback_record(
    req: &ApplicationRequest,
    ai_response: &str,
    rating: FeedbackRating,
    correction: Option<String>,
    timestamp: String,
) -> FeedbackRecord {
    FeedbackRecord {
        timestamp,
        applicant: req.applicant_name.clone(),
        amount_usd: req.amount_usd,
        credit_score: req.credit_score,
        details: req.details.clone(),
        ai_response: ai_response.to_string(),
        rating,
        correction: correction.filter(|c| !c.trim().is_empty()),
    }
}
