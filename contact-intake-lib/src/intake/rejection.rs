use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

use super::validator::{RequiredField, ValidationError};

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Terminal failures visible to the submitter.
///
/// Validation and rate-limit rejections carry actionable messages; every
/// other variant maps to a generic message so internal detail never leaks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Request body is not a valid submission")]
    MalformedRequest,

    #[error("Missing required fields")]
    MissingFields(Vec<RequiredField>),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Rate limit exceeded")]
    RateLimited { limit: u32, reset_after: Duration },

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Internal error")]
    Internal,
}

impl Rejection {
    /// Short label for logs and metrics
    pub fn error_type(&self) -> &'static str {
        match self {
            Rejection::MalformedRequest => "malformed_request",
            Rejection::MissingFields(_) => "missing_fields",
            Rejection::InvalidEmail => "invalid_email",
            Rejection::RateLimited { .. } => "rate_limited",
            Rejection::PayloadTooLarge => "payload_too_large",
            Rejection::Internal => "internal",
        }
    }

    /// Message returned to the submitter
    pub fn user_message(&self) -> String {
        match self {
            Rejection::MissingFields(fields) => format!(
                "Please fill in all required fields: {}.",
                fields.iter().map(RequiredField::as_str).collect::<Vec<_>>().join(", ")
            ),
            Rejection::InvalidEmail => "Please enter a valid email address.".to_string(),
            Rejection::RateLimited { reset_after, .. } => {
                let minutes = minutes_until_reset(*reset_after);
                let unit = if minutes == 1 { "minute" } else { "minutes" };
                format!("Too many submissions. Please try again in {minutes} {unit}.")
            }
            Rejection::PayloadTooLarge => "Your message is too long.".to_string(),
            Rejection::MalformedRequest | Rejection::Internal => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

/// Whole minutes until the window resets, rounded up, at least 1.
pub fn minutes_until_reset(reset_after: Duration) -> u64 {
    let millis = u64::try_from(reset_after.as_millis()).unwrap_or(u64::MAX);
    millis.div_ceil(60_000).max(1)
}

impl From<ValidationError> for Rejection {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::MissingFields(fields) => Rejection::MissingFields(fields),
            ValidationError::InvalidEmail => Rejection::InvalidEmail,
        }
    }
}

impl From<&Rejection> for StatusCode {
    fn from(r: &Rejection) -> StatusCode {
        match r {
            Rejection::MalformedRequest => StatusCode::INTERNAL_SERVER_ERROR,
            Rejection::MissingFields(_) => StatusCode::BAD_REQUEST,
            Rejection::InvalidEmail => StatusCode::BAD_REQUEST,
            Rejection::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Rejection::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Rejection::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
