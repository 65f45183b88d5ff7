//! Error types for clinic-scout.

use std::path::PathBuf;

/// Top-level error type for both pipelines.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Places error: {0}")]
    Places(#[from] PlacesError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Outreach error: {0}")]
    Outreach(#[from] OutreachError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the place-search API client.
#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {message}")]
    Status { status: String, message: String },
}

/// Errors from the CSV store and workbook export.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Required column {0:?} missing from CSV header")]
    MissingColumn(&'static str),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Errors raised while preparing or dispatching outreach mail.
#[derive(Debug, thiserror::Error)]
pub enum OutreachError {
    #[error("Could not read attachment {}: {source}", .path.display())]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid sender address {address}: {message}")]
    InvalidSender { address: String, message: String },

    #[error("Invalid recipient address {address}: {message}")]
    InvalidRecipient { address: String, message: String },

    #[error("Could not build message: {0}")]
    Compose(String),

    #[error("Could not configure SMTP relay {host}: {message}")]
    Relay { host: String, message: String },
}

/// Outcome of a single send attempt, as seen by the dispatch loop.
///
/// Authentication rejections are fatal to the whole run; everything else
/// affects only the recipient being attempted.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Relay rejected our credentials: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
