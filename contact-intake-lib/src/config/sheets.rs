use serde::Deserialize;

/// Google Sheets recorder configuration
///
/// When `spreadsheet_id` is absent the service still runs; submissions are
/// then only logged and every recorder call reports a configuration error.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SheetsConfig {
    /// Destination spreadsheet identifier
    /// Overridden by GOOGLE_SHEET_ID
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    /// OAuth2 bearer token with the spreadsheets scope
    /// Overridden by GOOGLE_SHEETS_ACCESS_TOKEN
    #[serde(default)]
    pub access_token: Option<String>,
    /// Sheets API base URL
    /// Default: "https://sheets.googleapis.com"
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Sheet name rows are appended to
    /// Default: "Sheet1"
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// Per-request timeout in seconds
    /// Default: 10
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            access_token: None,
            api_base: default_api_base(),
            sheet_name: default_sheet_name(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SheetsConfig {
    /// True when a destination is configured.
    pub fn is_configured(&self) -> bool {
        self.spreadsheet_id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }
}

fn default_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}
