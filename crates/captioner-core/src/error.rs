//! Error types for the captioning library.
//!
//! Vision API failures are a tagged taxonomy ([`ApiError`]) so that callers
//! decide between accepting a caption and quarantining an image by matching
//! on variants, never by inspecting message text.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for library operations.
#[derive(Error, Debug)]
pub enum CaptionerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Vision API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Tag utility errors
    #[error("Tag error: {0}")]
    Tag(#[from] TagError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Prompt archive CSV errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Image decode/encode errors
    #[error("Image error for {path}: {message}")]
    Image { path: PathBuf, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Failure of a single vision API call.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The endpoint answered with a non-success HTTP status
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection could not be established
    #[error("Error connecting: {0}")]
    Connect(String),

    /// Request exceeded the configured timeout
    #[error("Timeout error after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Any other transport-level failure
    #[error("Request failed: {0}")]
    Request(String),

    /// The provider returned a well-formed error payload
    #[error("Provider reported: {0}")]
    Provider(String),

    /// The response body could not be interpreted
    #[error("Failed to parse the API response: {message}")]
    Parse { message: String, body: String },

    /// A local file (image or prompt addition) could not be read
    #[error("Error reading file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// HTTP status code, when the failure carried one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify a reqwest transport error.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ApiError::Timeout { timeout_secs }
        } else if err.is_connect() {
            ApiError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ApiError::Request(err.to_string())
        }
    }
}

/// Tag utility errors.
#[derive(Error, Debug)]
pub enum TagError {
    /// A replacement pair was not in `old:new` form
    #[error("Tags to replace must be in 'old_tag:new_tag' format separated by commas, got '{0}'")]
    InvalidReplacement(String),

    /// Translation backend failure
    #[error("Translation failed: {0}")]
    Translation(#[from] ApiError),
}

/// Convenience type alias for library results.
pub type Result<T> = std::result::Result<T, CaptionerError>;

/// Convenience type alias for API call results.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
