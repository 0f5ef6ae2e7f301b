use crate::config::Config;
use crate::security::rate_limit::MAX_WINDOW;

pub fn validate(config: &Config) -> Result<(), String> {
    let rate_limit = &config.security.rate_limit;
    if rate_limit.max_requests == 0 {
        return Err("security.rate_limit.max_requests must be > 0".into());
    }
    if rate_limit.window_secs == 0 {
        return Err("security.rate_limit.window_secs must be > 0".into());
    }
    if rate_limit.window_secs > MAX_WINDOW.as_secs() {
        return Err(format!(
            "security.rate_limit.window_secs must be <= {} (one year)",
            MAX_WINDOW.as_secs()
        ));
    }
    if rate_limit.sweep_interval_secs == 0 {
        return Err("security.rate_limit.sweep_interval_secs must be > 0".into());
    }
    if !config.intake.path.starts_with('/') {
        return Err("intake.path must start with '/'".into());
    }
    if config.intake.max_body_bytes == 0 {
        return Err("intake.max_body_bytes must be > 0".into());
    }
    if config.timeout.fanout_secs == 0 {
        return Err("timeout.fanout_secs must be > 0".into());
    }
    if config.timeout.body_read_secs == 0 {
        return Err("timeout.body_read_secs must be > 0".into());
    }
    if config.sheets.request_timeout_secs == 0 {
        return Err("sheets.request_timeout_secs must be > 0".into());
    }
    if config.sheets.api_base.trim().is_empty() {
        return Err("sheets.api_base cannot be empty".into());
    }
    if config.sheets.sheet_name.trim().is_empty() {
        return Err("sheets.sheet_name cannot be empty".into());
    }
    Ok(())
}
