use thiserror::Error;

/// Errors that can occur in the intake service
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Recorder error: {0}")]
    Recorder(#[from] crate::recorder::RecorderError),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

pub type Result<T> = std::result::Result<T, IntakeError>;
