//! Captioner Core - batch image captioning through vision-language APIs.
//!
//! Sends images to an OpenAI-compatible chat completion endpoint or to the
//! DashScope multimodal endpoint and writes each reply next to its image as
//! a `.txt` caption file.
//!
//! # Architecture
//!
//! ```text
//! Discover → Dispatch (bounded workers) → Expand prompt → API call (retry)
//!          → Write caption | Quarantine image
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use captioner_core::{CaptionClient, CaptionOptions, Config, RetryPolicy};
//!
//! #[tokio::main]
//! async fn main() -> captioner_core::Result<()> {
//!     let config = Config::load()?;
//!     let client = CaptionClient::for_endpoint(
//!         &config.api.default_url,
//!         "sk-...",
//!         &config.api.model,
//!         RetryPolicy::from_config(&config.retry),
//!         CaptionOptions::from_config(&config),
//!     );
//!     let caption = client.caption("./image.jpg".as_ref(), "Describe the image").await?;
//!     println!("{}", caption.text);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod caption;
pub mod config;
pub mod discovery;
pub mod error;
pub mod llm;
pub mod preprocess;
pub mod prompt;
pub mod settings;
pub mod tags;

pub use batch::{
    BatchReport, CaptionBatch, CaptionOutcome, Dispatcher, JobResult, Quarantine, WatermarkAction,
    WatermarkBatch, WatermarkOutcome,
};
pub use caption::HandlingMode;
pub use config::Config;
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use error::{ApiError, ApiResult, CaptionerError, ConfigError, Result, TagError};
pub use llm::{Caption, CaptionClient, CaptionOptions, ProviderKind, Quality, RetryPolicy};
pub use prompt::PromptArchive;
pub use settings::{DefaultModel, Settings, SettingsStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
