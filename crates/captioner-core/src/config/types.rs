//! Sub-configuration structs with their defaults.

use crate::caption::HandlingMode;
use crate::llm::Quality;
use serde::{Deserialize, Serialize};

/// Vision API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Endpoint used when neither the CLI nor the settings file names one
    pub default_url: String,

    /// Model name sent to OpenAI-style endpoints
    pub model: String,

    /// Image detail hint ("auto", "high", "low")
    pub quality: Quality,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum tokens requested per caption
    pub max_tokens: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4-vision-preview".to_string(),
            quality: Quality::Auto,
            timeout_secs: 10,
            max_tokens: 300,
        }
    }
}

/// Batch dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of concurrent API workers
    pub workers: usize,

    /// Jobs buffered between the feeder and the workers
    pub queue_capacity: usize,

    /// Image extensions picked up by the directory walk (case-insensitive)
    pub supported_formats: Vec<String>,

    /// Name of the quarantine directory created next to the batch directory
    pub quarantine_dir: String,

    /// What to do when a caption file already exists
    pub handling_mode: HandlingMode,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            queue_capacity: 32,
            supported_formats: ["png", "jpg", "jpeg", "webp", "bmp", "gif", "tiff", "tif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            quarantine_dir: "error_images".to_string(),
            handling_mode: HandlingMode::Overwrite,
        }
    }
}

/// Automatic retry settings for transient API failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Base backoff delay in milliseconds (doubled per retry)
    pub backoff_base_ms: u64,

    /// HTTP statuses that trigger a retry
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base_ms: 1000,
            status_forcelist: vec![429, 500, 502, 503, 504],
        }
    }
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathsConfig {
    /// API settings JSON; defaults to `api_settings.json` in the config directory
    pub settings_file: Option<String>,

    /// Saved prompts CSV; defaults to `saved_prompts.csv` in the config directory
    pub prompts_file: Option<String>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
