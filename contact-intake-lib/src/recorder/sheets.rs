use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{Recorder, RecorderError};
use crate::config::{SheetsConfig, ENV_ACCESS_TOKEN, ENV_SHEET_ID};
use crate::intake::SubmissionRecord;

/// Column titles written by [`SheetsRecorder::initialize_sheet`]
pub const HEADER_ROW: [&str; 9] = [
    "Timestamp",
    "Name",
    "Email",
    "Phone",
    "Project Type",
    "Budget",
    "Timeline",
    "Message",
    "IP Address",
];

#[derive(Serialize)]
struct ValueRange<'a> {
    values: Vec<Vec<&'a str>>,
}

/// Appends submissions as rows of a Google Sheet through the Sheets v4 REST API.
pub struct SheetsRecorder {
    client: Client,
    config: SheetsConfig,
}

impl SheetsRecorder {
    pub fn new(config: SheetsConfig) -> Result<Self, RecorderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Write the column titles into the first row of the sheet.
    pub async fn initialize_sheet(&self) -> Result<(), RecorderError> {
        let range = format!("{}!A1:I1", self.config.sheet_name);
        let url = self.values_url(&range, "")?;
        let body = ValueRange { values: vec![HEADER_ROW.to_vec()] };

        let resp = self
            .client
            .put(url)
            .bearer_auth(self.access_token()?)
            .json(&body)
            .send()
            .await?;
        check_status(resp).await?;

        info!(sheet = %self.config.sheet_name, "spreadsheet header row initialized");
        Ok(())
    }

    async fn append_row(&self, row: &[String]) -> Result<(), RecorderError> {
        let range = format!("{}!A:I", self.config.sheet_name);
        let url = self.values_url(&range, ":append")?;
        let body = ValueRange { values: vec![row.iter().map(String::as_str).collect()] };

        let resp = self
            .client
            .post(url)
            .bearer_auth(self.access_token()?)
            .json(&body)
            .send()
            .await?;
        check_status(resp).await
    }

    /// `{api_base}/v4/spreadsheets/{id}/values/{range}{action}?valueInputOption=RAW`
    fn values_url(&self, range: &str, action: &str) -> Result<Url, RecorderError> {
        let id = self
            .config
            .spreadsheet_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(RecorderError::NotConfigured(ENV_SHEET_ID))?;

        let last = format!("{range}{action}");
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| RecorderError::InvalidUrl(format!("{}: {e}", self.config.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| RecorderError::InvalidUrl(self.config.api_base.clone()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", id, "values", last.as_str()]);
        url.set_query(Some("valueInputOption=RAW"));
        Ok(url)
    }

    fn access_token(&self) -> Result<&str, RecorderError> {
        self.config
            .access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(RecorderError::NotConfigured(ENV_ACCESS_TOKEN))
    }
}

#[async_trait]
impl Recorder for SheetsRecorder {
    async fn record(&self, record: &SubmissionRecord) -> Result<(), RecorderError> {
        self.append_row(&record.to_row()).await?;
        debug!(submission_id = %record.submission_id, "submission appended to spreadsheet");
        Ok(())
    }
}

async fn check_status(resp: reqwest::Response) -> Result<(), RecorderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RecorderError::Rejected { status: status.as_u16(), body })
}
