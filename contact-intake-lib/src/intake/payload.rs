use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Contact form submission as received on the wire (untrusted).
///
/// Missing or `null` required keys deserialize to empty strings so that
/// they are reported as missing fields rather than as a malformed request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmissionPayload {
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    pub phone: Option<String>,
    /// new-build | renovation | extension | commercial
    pub project_type: Option<String>,
    /// under-500k | 500k-1m | 1m-2m | over-2m
    pub budget: Option<String>,
    /// asap | 1-3months | 3-6months | 6months+
    pub timeline: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub message: String,
    /// Hidden field; only bots fill it in
    pub honeypot: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Payload fields after validation: trimmed, optional blanks dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub project_type: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub message: String,
}

/// Normalized submission handed to the recorder and telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub submission_id: String,
    /// RFC 3339 UTC instant with millisecond precision
    pub timestamp: String,
    pub name: String,
    /// Lower-cased
    pub email: String,
    pub phone: Option<String>,
    pub project_type: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub message: String,
    pub client_ip: String,
}

impl SubmissionRecord {
    pub fn new(
        submission: ValidSubmission,
        submission_id: String,
        client_ip: String,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            submission_id,
            timestamp: received_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            name: submission.name,
            email: submission.email.to_lowercase(),
            phone: submission.phone,
            project_type: submission.project_type,
            budget: submission.budget,
            timeline: submission.timeline,
            message: submission.message,
            client_ip,
        }
    }

    /// Spreadsheet row: timestamp, name, email, phone, project type, budget,
    /// timeline, message, IP address.
    pub fn to_row(&self) -> Vec<String> {
        let ip = if self.client_ip.is_empty() { "N/A" } else { self.client_ip.as_str() };
        vec![
            self.timestamp.clone(),
            self.name.clone(),
            self.email.clone(),
            self.phone.clone().unwrap_or_default(),
            self.project_type.clone().unwrap_or_default(),
            self.budget.clone().unwrap_or_default(),
            self.timeline.clone().unwrap_or_default(),
            self.message.clone(),
            ip.to_string(),
        ]
    }
}
