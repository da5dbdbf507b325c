//! One-call-per-image caption client.
//!
//! Reads the image, expands the prompt, and calls the provider under the
//! retry policy. Every failure comes back as a tagged [`ApiError`].

use super::provider::{CaptionProvider, CaptionRequest, ImageInput, ProviderFactory, Quality};
use super::retry::RetryPolicy;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::prompt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Per-call options shared by every image in a batch.
#[derive(Debug, Clone)]
pub struct CaptionOptions {
    /// Image detail hint
    pub quality: Quality,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl Default for CaptionOptions {
    fn default() -> Self {
        Self {
            quality: Quality::Auto,
            timeout: Duration::from_secs(10),
            max_tokens: 300,
        }
    }
}

impl CaptionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            quality: config.api.quality,
            timeout: Duration::from_secs(config.api.timeout_secs),
            max_tokens: config.api.max_tokens,
        }
    }
}

/// A successful caption.
#[derive(Debug, Clone)]
pub struct Caption {
    pub text: String,
    pub model: String,
    pub latency_ms: u64,
    /// Calls made, including the successful one
    pub attempts: u32,
}

/// Caption client bound to one provider and retry policy.
#[derive(Clone)]
pub struct CaptionClient {
    provider: Arc<dyn CaptionProvider>,
    retry: RetryPolicy,
    options: CaptionOptions,
}

impl CaptionClient {
    pub fn new(
        provider: Box<dyn CaptionProvider>,
        retry: RetryPolicy,
        options: CaptionOptions,
    ) -> Self {
        Self {
            provider: Arc::from(provider),
            retry,
            options,
        }
    }

    /// Build a client for an endpoint, choosing the provider by URL.
    pub fn for_endpoint(
        api_url: &str,
        api_key: &str,
        model: &str,
        retry: RetryPolicy,
        options: CaptionOptions,
    ) -> Self {
        let provider = ProviderFactory::create(api_url, api_key, model, options.timeout);
        tracing::debug!("Using {} provider for {api_url}", provider.name());
        Self::new(provider, retry, options)
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn options(&self) -> &CaptionOptions {
        &self.options
    }

    /// Caption one image with `prompt`.
    pub async fn caption(&self, image_path: &Path, prompt: &str) -> ApiResult<Caption> {
        let prompt = prompt::expand(prompt, image_path)?;

        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|source| ApiError::FileRead {
                path: image_path.to_path_buf(),
                source,
            })?;

        let request = CaptionRequest {
            image: ImageInput::from_bytes(&bytes, image_path),
            prompt,
            max_tokens: self.options.max_tokens,
            quality: self.options.quality,
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let outcome =
                match tokio::time::timeout(self.options.timeout, self.provider.generate(&request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ApiError::Timeout {
                        timeout_secs: self.options.timeout.as_secs(),
                    }),
                };

            match outcome {
                Ok(response) => {
                    return Ok(Caption {
                        text: response.text,
                        model: response.model,
                        latency_ms: response.latency_ms,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    let retries_used = attempt - 1;
                    if retries_used >= self.retry.max_retries
                        || !self.retry.allows_method("POST")
                        || !self.retry.is_retryable(&e)
                    {
                        tracing::debug!("Giving up on {:?} after {attempt} attempt(s): {e}", image_path);
                        return Err(e);
                    }
                    let delay = self.retry.delay_for(attempt);
                    tracing::debug!(
                        "Retry {attempt}/{} for {:?} after {delay:?}: {e}",
                        self.retry.max_retries,
                        image_path
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockProvider;
    use std::sync::atomic::Ordering;

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_base_ms: 5,
            ..RetryPolicy::default()
        }
    }

    fn image_fixture() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beach.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_caption_success() {
        let (_dir, image) = image_fixture();
        let client = CaptionClient::new(
            Box::new(MockProvider::success("sand, sea")),
            fast_retry(0),
            CaptionOptions::default(),
        );

        let caption = client.caption(&image, "tag").await.unwrap();
        assert_eq!(caption.text, "sand, sea");
        assert_eq!(caption.attempts, 1);
    }

    #[tokio::test]
    async fn test_retry_on_rate_limit() {
        let (_dir, image) = image_fixture();
        let provider = MockProvider::fail_then_succeed(429, "recovered");
        let calls = provider.call_count_handle();
        let client = CaptionClient::new(Box::new(provider), fast_retry(5), CaptionOptions::default());

        let caption = client.caption(&image, "tag").await.unwrap();
        assert_eq!(caption.text, "recovered");
        assert_eq!(caption.attempts, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_retry_on_auth_error() {
        let (_dir, image) = image_fixture();
        let provider = MockProvider::failing(401);
        let calls = provider.call_count_handle();
        let client = CaptionClient::new(Box::new(provider), fast_retry(5), CaptionOptions::default());

        let err = client.caption(&image, "tag").await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let (_dir, image) = image_fixture();
        let provider = MockProvider::failing(503);
        let calls = provider.call_count_handle();
        let client = CaptionClient::new(Box::new(provider), fast_retry(2), CaptionOptions::default());

        let err = client.caption(&image, "tag").await.unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        // 1 initial + 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_is_tagged() {
        let (_dir, image) = image_fixture();
        let provider = MockProvider::success("too slow").with_delay(Duration::from_secs(5));
        let options = CaptionOptions {
            timeout: Duration::from_millis(50),
            ..CaptionOptions::default()
        };
        let client = CaptionClient::new(Box::new(provider), fast_retry(0), options);

        let err = client.caption(&image, "tag").await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_image_never_calls_provider() {
        let provider = MockProvider::success("unreachable");
        let calls = provider.call_count_handle();
        let client = CaptionClient::new(Box::new(provider), fast_retry(3), CaptionOptions::default());

        let err = client
            .caption(Path::new("/nonexistent/ghost.jpg"), "tag")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::FileRead { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prompt_is_expanded_before_sending() {
        let (dir, image) = image_fixture();
        let extra = dir.path().join("extra");
        std::fs::create_dir(&extra).unwrap();
        std::fs::write(extra.join("beach.txt"), "sunny").unwrap();

        let provider = MockProvider::success("ok");
        let prompts = provider.prompts_handle();
        let client = CaptionClient::new(Box::new(provider), fast_retry(0), CaptionOptions::default());

        client
            .caption(&image, &format!("Weather: {{{}}}", extra.display()))
            .await
            .unwrap();
        assert_eq!(prompts.lock().unwrap().as_slice(), ["Weather: sunny"]);
    }
}
