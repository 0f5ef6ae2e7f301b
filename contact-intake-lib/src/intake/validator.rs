use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::error;

use super::payload::{SubmissionPayload, ValidSubmission};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// `None` only if the pattern fails to compile, in which case every email is
/// rejected as invalid; `test_email_pattern_compiles` guards against that.
static EMAIL_SHAPE: LazyLock<Option<Regex>> = LazyLock::new(|| match Regex::new(EMAIL_PATTERN) {
    Ok(re) => Some(re),
    Err(e) => {
        error!(error = %e, "email pattern failed to compile, rejecting all emails");
        None
    }
});

/// Fields that must be non-empty after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Name,
    Email,
    Message,
}

impl RequiredField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredField::Name => "name",
            RequiredField::Email => "email",
            RequiredField::Message => "message",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", join(.0))]
    MissingFields(Vec<RequiredField>),

    #[error("invalid email address")]
    InvalidEmail,
}

fn join(fields: &[RequiredField]) -> String {
    fields.iter().map(RequiredField::as_str).collect::<Vec<_>>().join(", ")
}

/// Check required fields, then the email shape.
///
/// Returns the trimmed fields. Optional fields that are blank after
/// trimming become `None`.
pub fn validate(payload: &SubmissionPayload) -> Result<ValidSubmission, ValidationError> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    let message = payload.message.trim();

    let missing: Vec<RequiredField> = [
        (RequiredField::Name, name),
        (RequiredField::Email, email),
        (RequiredField::Message, message),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(field, _)| field)
    .collect();

    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    if !is_email_shaped(email) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(ValidSubmission {
        name: name.to_string(),
        email: email.to_string(),
        phone: optional(&payload.phone),
        project_type: optional(&payload.project_type),
        budget: optional(&payload.budget),
        timeline: optional(&payload.timeline),
        message: message.to_string(),
    })
}

/// `local@domain.tld`, none of the parts containing whitespace or `@`.
pub fn is_email_shaped(email: &str) -> bool {
    EMAIL_SHAPE.as_ref().is_some_and(|re| re.is_match(email))
}

fn optional(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
