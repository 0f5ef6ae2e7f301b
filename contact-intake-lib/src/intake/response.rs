use http::StatusCode;
use serde::Serialize;
use std::time::Duration;

use super::rejection::Rejection;

pub const SUCCESS_MESSAGE: &str = "Thank you for your enquiry! We'll be in touch soon.";

/// JSON body of every intake response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
}

/// Rate limit state exposed through response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    /// Set only when the request was rejected
    pub retry_after: Option<Duration>,
}

/// Outcome of one submission, independent of the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
    pub rate_limit: Option<RateLimitInfo>,
}

impl IntakeResponse {
    pub fn accepted(submission_id: String, rate_limit: Option<RateLimitInfo>) -> Self {
        Self {
            status: StatusCode::OK,
            body: ResponseBody {
                success: true,
                message: SUCCESS_MESSAGE.to_string(),
                submission_id: Some(submission_id),
            },
            rate_limit,
        }
    }

    pub fn rejected(rejection: &Rejection) -> Self {
        let rate_limit = match rejection {
            Rejection::RateLimited { limit, reset_after } => Some(RateLimitInfo {
                limit: *limit,
                remaining: 0,
                retry_after: Some(*reset_after),
            }),
            _ => None,
        };
        Self {
            status: StatusCode::from(rejection),
            body: ResponseBody {
                success: false,
                message: rejection.user_message(),
                submission_id: None,
            },
            rate_limit,
        }
    }

    pub fn is_success(&self) -> bool {
        self.body.success
    }

    pub fn submission_id(&self) -> Option<&str> {
        self.body.submission_id.as_deref()
    }
}
