//! Configurable mock provider shared by the client and batch tests.

use super::provider::{CaptionProvider, CaptionRequest, CaptionResponse};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type ResponseFn = Box<dyn Fn(u32, &CaptionRequest) -> ApiResult<CaptionResponse> + Send + Sync>;

/// Each call to `generate()` invokes the response factory with the current
/// call index and request, so tests can vary results per attempt or per image.
pub(crate) struct MockProvider {
    response_fn: ResponseFn,
    call_count: Arc<AtomicU32>,
    delay: Option<Duration>,
    /// (in_flight, max_concurrent)
    in_flight: Option<(Arc<AtomicU32>, Arc<AtomicU32>)>,
    prompts: Arc<Mutex<Vec<String>>>,
}

pub(crate) fn ok(text: &str) -> ApiResult<CaptionResponse> {
    Ok(CaptionResponse {
        text: text.to_string(),
        model: "mock-v1".to_string(),
        latency_ms: 1,
    })
}

impl MockProvider {
    pub(crate) fn new(
        f: impl Fn(u32, &CaptionRequest) -> ApiResult<CaptionResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            response_fn: Box::new(f),
            call_count: Arc::new(AtomicU32::new(0)),
            delay: None,
            in_flight: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn success(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_, _| ok(&text))
    }

    pub(crate) fn failing(status: u16) -> Self {
        Self::new(move |_, _| {
            Err(ApiError::Http {
                status,
                body: format!("mock status {status}"),
            })
        })
    }

    /// First call fails with `status`, later calls succeed.
    pub(crate) fn fail_then_succeed(status: u16, text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |idx, _| {
            if idx == 0 {
                Err(ApiError::Http {
                    status,
                    body: "transient".to_string(),
                })
            } else {
                ok(&text)
            }
        })
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn tracking_concurrency(
        mut self,
        in_flight: Arc<AtomicU32>,
        max_concurrent: Arc<AtomicU32>,
    ) -> Self {
        self.in_flight = Some((in_flight, max_concurrent));
        self
    }

    pub(crate) fn call_count_handle(&self) -> Arc<AtomicU32> {
        self.call_count.clone()
    }

    pub(crate) fn prompts_handle(&self) -> Arc<Mutex<Vec<String>>> {
        self.prompts.clone()
    }
}

#[async_trait]
impl CaptionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &CaptionRequest) -> ApiResult<CaptionResponse> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }
        if let Some((ref in_flight, ref max_concurrent)) = self.in_flight {
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_concurrent.fetch_max(current, Ordering::SeqCst);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = (self.response_fn)(idx, request);
        if let Some((ref in_flight, _)) = self.in_flight {
            in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        result
    }
}
