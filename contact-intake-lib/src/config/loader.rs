use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::{validate, Config};
use crate::error::{IntakeError, Result};

/// Environment variable holding the destination spreadsheet id
pub const ENV_SHEET_ID: &str = "GOOGLE_SHEET_ID";
/// Environment variable holding the Sheets API bearer token
pub const ENV_ACCESS_TOKEN: &str = "GOOGLE_SHEETS_ACCESS_TOKEN";

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| IntakeError::Config(format!("Failed to read config file: {e}")))?;
    let mut cfg: Config = toml::from_str(&txt)
        .map_err(|e| IntakeError::Config(format!("Failed to parse config: {e}")))?;

    apply_env_overrides(&mut cfg);
    validate(&cfg).map_err(IntakeError::Config)?;

    Ok(cfg)
}

/// Recorder credentials from the environment take precedence over the file.
/// Empty values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Some(id) = non_empty_env(ENV_SHEET_ID) {
        debug!(var = ENV_SHEET_ID, "spreadsheet id taken from environment");
        cfg.sheets.spreadsheet_id = Some(id);
    }
    if let Some(token) = non_empty_env(ENV_ACCESS_TOKEN) {
        debug!(var = ENV_ACCESS_TOKEN, "sheets access token taken from environment");
        cfg.sheets.access_token = Some(token);
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
