//! Error types for the migration pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parsing failed: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to resolve {url}: {message}")]
    ResolveFailed { url: String, message: String },

    #[error("Failed to download {url}: {message}")]
    DownloadFailed { url: String, message: String },

    #[error("API request to {path} returned {status}: {body}")]
    ApiError {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Thumbnail fetch failed: {0}")]
    ThumbnailFailed(String),
}

pub type Result<T> = std::result::Result<T, MigrationError>;
