//! Alibaba DashScope provider for Qwen-VL multimodal generation.
//!
//! DashScope wraps messages in an `input` object and returns content as a
//! list of items, where grounding replies carry a `box` item before the text.

use super::provider::{CaptionProvider, CaptionRequest, CaptionResponse};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// URL path suffix that identifies a DashScope endpoint.
pub const DASHSCOPE_PATH_SUFFIX: &str = "/v1/services/aigc/multimodal-generation/generation";

/// Model used for every DashScope call.
pub const DASHSCOPE_MODEL: &str = "qwen-vl-plus";

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub struct DashScopeProvider {
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl DashScopeProvider {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            timeout,
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct GenerationRequest {
    model: String,
    input: GenerationInput,
    parameters: GenerationParameters,
}

#[derive(Serialize)]
struct GenerationInput {
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<ContentItem>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ContentItem {
    Image { image: String },
    Text { text: String },
}

#[derive(Serialize)]
struct GenerationParameters {
    max_length: u32,
}

// --- Response types ---

#[derive(Deserialize)]
struct GenerationResponse {
    output: Option<Output>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct Output {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Vec<ResponseItem>,
}

#[derive(Deserialize)]
struct ResponseItem {
    text: Option<String>,
    #[serde(rename = "box")]
    bounding_box: Option<String>,
}

fn ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<ref>(.*?)</ref>").expect("static regex is valid"))
}

/// Extract the caption from DashScope content items.
///
/// Plain replies carry text in the first item. Grounding replies carry a
/// `box` first; the caption is then the `<ref>` label followed by the text of
/// the second item.
fn extract_caption(items: &[ResponseItem]) -> Option<String> {
    let first = items.first()?;
    if let Some(text) = first.text.as_deref().filter(|t| !t.is_empty()) {
        return Some(text.to_string());
    }
    let box_value = first.bounding_box.as_deref()?;
    let label = ref_pattern()
        .captures(box_value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())?;
    let text = items.get(1).and_then(|i| i.text.as_deref()).unwrap_or("");
    Some(format!("{label}{text}"))
}

#[async_trait]
impl CaptionProvider for DashScopeProvider {
    fn name(&self) -> &str {
        "dashscope"
    }

    async fn generate(&self, request: &CaptionRequest) -> ApiResult<CaptionResponse> {
        let start = Instant::now();

        let body = GenerationRequest {
            model: DASHSCOPE_MODEL.to_string(),
            input: GenerationInput {
                messages: vec![
                    Message {
                        role: "system".to_string(),
                        content: vec![ContentItem::Text {
                            text: SYSTEM_PROMPT.to_string(),
                        }],
                    },
                    Message {
                        role: "user".to_string(),
                        content: vec![
                            ContentItem::Image {
                                image: request.image.data_url(),
                            },
                            ContentItem::Text {
                                text: request.prompt.clone(),
                            },
                        ],
                    },
                ],
            },
            parameters: GenerationParameters {
                max_length: request.max_tokens,
            },
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout.as_secs()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout.as_secs()))?;

        let parsed: Option<GenerationResponse> = serde_json::from_str(&text).ok();

        // Bad requests carry a DashScope error code; surface it as a provider error
        if status.as_u16() == 400 {
            let message = parsed
                .and_then(|p| p.message)
                .unwrap_or_else(|| text.clone());
            return Err(ApiError::Provider(message));
        }
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed = parsed.ok_or_else(|| ApiError::Parse {
            message: "response is not valid DashScope JSON".to_string(),
            body: text.clone(),
        })?;

        if let Some(code) = parsed.code.filter(|c| !c.is_empty()) {
            let message = parsed.message.unwrap_or_default();
            return Err(ApiError::Provider(format!("{code}: {message}")));
        }

        let caption = parsed
            .output
            .as_ref()
            .and_then(|o| o.choices.first())
            .and_then(|c| extract_caption(&c.message.content))
            .ok_or_else(|| ApiError::Parse {
                message: "response has no output.choices[0].message.content".to_string(),
                body: text.clone(),
            })?;

        Ok(CaptionResponse {
            text: caption.trim().to_string(),
            model: DASHSCOPE_MODEL.to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::{ImageInput, Quality};
    use std::path::Path;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn item(text: Option<&str>, bounding_box: Option<&str>) -> ResponseItem {
        ResponseItem {
            text: text.map(String::from),
            bounding_box: bounding_box.map(String::from),
        }
    }

    #[test]
    fn test_extract_plain_text() {
        let items = vec![item(Some("a red car"), None)];
        assert_eq!(extract_caption(&items).as_deref(), Some("a red car"));
    }

    #[test]
    fn test_extract_grounding_reply() {
        let items = vec![
            item(None, Some("<ref>the dog</ref><box>(1,2),(3,4)</box>")),
            item(Some(" is sleeping"), None),
        ];
        assert_eq!(extract_caption(&items).as_deref(), Some("the dog is sleeping"));
    }

    #[test]
    fn test_extract_empty_is_none() {
        assert!(extract_caption(&[]).is_none());
        assert!(extract_caption(&[item(None, Some("no ref here"))]).is_none());
    }

    fn provider(server: &MockServer) -> DashScopeProvider {
        DashScopeProvider::new(
            &format!("{}/api{}", server.uri(), DASHSCOPE_PATH_SUFFIX),
            "ds-key",
            Duration::from_secs(5),
        )
    }

    fn request() -> CaptionRequest {
        CaptionRequest {
            image: ImageInput::from_bytes(&[1, 2, 3], Path::new("a.png")),
            prompt: "describe".to_string(),
            max_tokens: 300,
            quality: Quality::Auto,
        }
    }

    #[tokio::test]
    async fn test_generate_parses_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/api{DASHSCOPE_PATH_SUFFIX}")))
            .and(body_partial_json(serde_json::json!({
                "model": "qwen-vl-plus",
                "parameters": {"max_length": 300}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": {"choices": [{"message": {"content": [{"text": "a lighthouse"}]}}]}
            })))
            .mount(&server)
            .await;

        let resp = provider(&server).generate(&request()).await.unwrap();
        assert_eq!(resp.text, "a lighthouse");
        assert_eq!(resp.model, DASHSCOPE_MODEL);
    }

    #[tokio::test]
    async fn test_bad_request_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": "InvalidParameter",
                "message": "image too large"
            })))
            .mount(&server)
            .await;

        let err = provider(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, ApiError::Provider(ref m) if m == "image too large"));
    }
}
