//! Caption provider trait and request/response types.
//!
//! Defines the interface every vision endpoint implements, plus the factory
//! that picks a provider from the endpoint URL.

use crate::error::ApiResult;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Image detail hint forwarded to OpenAI-style endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Auto,
    /// More detail, more expensive
    High,
    /// Less detail, cheaper
    Low,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Auto => "auto",
            Quality::High => "high",
            Quality::Low => "low",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base64-encoded image ready to send to a vision API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and the file's path.
    ///
    /// The data URL's MIME type comes from the extension, not a fixed
    /// `image/jpeg`. Unknown extensions fall back to `image/jpeg`.
    pub fn from_bytes(bytes: &[u8], path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let media_type = match ext.as_str() {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "tif" | "tiff" => "image/tiff",
            other => {
                tracing::warn!("Unknown image extension '{other}', defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Return a data URL suitable for inline image fields.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// A request to caption one image.
#[derive(Debug, Clone)]
pub struct CaptionRequest {
    /// The image to caption
    pub image: ImageInput,
    /// Prompt text, already expanded
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Detail hint
    pub quality: Quality,
}

/// The response from a caption call.
#[derive(Debug, Clone)]
pub struct CaptionResponse {
    /// Generated caption text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all caption providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the client holds an `Arc<dyn CaptionProvider>`).
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Provider name for logging (e.g., "openai", "dashscope").
    fn name(&self) -> &str;

    /// Generate a caption for the given request.
    async fn generate(&self, request: &CaptionRequest) -> ApiResult<CaptionResponse>;
}

/// Endpoint families, recognized purely by URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI-style chat completions (the default)
    OpenAi,
    /// Alibaba DashScope multimodal generation
    DashScope,
}

impl ProviderKind {
    /// Select the provider family for an endpoint URL.
    pub fn from_url(api_url: &str) -> Self {
        if api_url
            .trim_end_matches('/')
            .ends_with(super::dashscope::DASHSCOPE_PATH_SUFFIX)
        {
            ProviderKind::DashScope
        } else {
            ProviderKind::OpenAi
        }
    }
}

/// Factory that creates the appropriate provider for an endpoint.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider for `api_url`.
    ///
    /// # Arguments
    /// * `api_url` - Full endpoint URL; its suffix selects the provider
    /// * `api_key` - Bearer token
    /// * `model` - Model name for OpenAI-style endpoints (DashScope uses its own)
    /// * `timeout` - Per-request timeout
    pub fn create(
        api_url: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Box<dyn CaptionProvider> {
        match ProviderKind::from_url(api_url) {
            ProviderKind::DashScope => Box::new(super::dashscope::DashScopeProvider::new(
                api_url, api_key, timeout,
            )),
            ProviderKind::OpenAi => Box::new(super::openai::OpenAiProvider::new(
                api_url, api_key, model, timeout,
            )),
        }
    }
}

/// Resolve `${ENV_VAR}` references in key strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_input_media_type_from_extension() {
        let input = ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], Path::new("a.JPG"));
        assert_eq!(input.media_type, "image/jpeg");
        let input = ImageInput::from_bytes(&[0x89, 0x50], Path::new("a.png"));
        assert_eq!(input.media_type, "image/png");
        let input = ImageInput::from_bytes(&[0], Path::new("a.heic"));
        assert!(input.data_url().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_image_input_data_url() {
        let input = ImageInput::from_bytes(&[1, 2, 3], Path::new("x.jpeg"));
        assert_eq!(input.data_url(), "data:image/jpeg;base64,AQID");
    }

    #[test]
    fn test_provider_kind_from_url() {
        assert_eq!(
            ProviderKind::from_url("https://api.openai.com/v1/chat/completions"),
            ProviderKind::OpenAi
        );
        assert_eq!(
            ProviderKind::from_url(
                "https://dashscope.aliyuncs.com/api/v1/services/aigc/multimodal-generation/generation"
            ),
            ProviderKind::DashScope
        );
    }

    #[test]
    fn test_factory_picks_provider_name() {
        let timeout = Duration::from_secs(10);
        let p = ProviderFactory::create("http://localhost/v1/chat/completions", "k", "m", timeout);
        assert_eq!(p.name(), "openai");
        let p = ProviderFactory::create(
            "http://localhost/api/v1/services/aigc/multimodal-generation/generation",
            "k",
            "m",
            timeout,
        );
        assert_eq!(p.name(), "dashscope");
    }

    #[test]
    fn test_quality_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Quality::High).unwrap(), "\"high\"");
        assert_eq!(Quality::Auto.to_string(), "auto");
    }

    #[test]
    fn test_resolve_env_var() {
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        assert_eq!(resolve_env_var(""), None);
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_XYZ_123}"), None);
    }
}
