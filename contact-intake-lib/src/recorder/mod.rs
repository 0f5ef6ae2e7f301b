//! Persistence of accepted submissions.
//!
//! The pipeline treats every recorder failure as non-fatal: it is logged and
//! counted, and the submitter still receives a success response.

mod sheets;

use async_trait::async_trait;
use thiserror::Error;

use crate::intake::SubmissionRecord;

pub use sheets::{SheetsRecorder, HEADER_ROW};

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("invalid destination URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Destination for accepted submissions.
#[async_trait]
pub trait Recorder: Send + Sync {
    async fn record(&self, record: &SubmissionRecord) -> Result<(), RecorderError>;
}
