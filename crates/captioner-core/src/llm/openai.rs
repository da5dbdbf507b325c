//! OpenAI-style provider using the Chat Completions API.
//!
//! Sends the prompt and the image (inline data URL with a detail hint) in one
//! user message. Any endpoint speaking this shape works, including local
//! CogVLM servers.

use super::provider::{CaptionProvider, CaptionRequest, CaptionResponse};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Provider for OpenAI-compatible chat completion endpoints.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            timeout,
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
    detail: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    model: Option<String>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[async_trait]
impl CaptionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &CaptionRequest) -> ApiResult<CaptionResponse> {
        let start = Instant::now();

        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ChatContent::Text {
                        text: request.prompt.clone(),
                    },
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image.data_url(),
                            detail: request.quality.to_string(),
                        },
                    },
                ],
            }],
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
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let chat_resp: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::Parse {
                message: e.to_string(),
                body: text.clone(),
            })?;

        if let Some(error) = chat_resp.error {
            return Err(ApiError::Provider(error.message));
        }

        let caption = chat_resp
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| ApiError::Parse {
                message: "response has no choices[0].message.content".to_string(),
                body: text.clone(),
            })?;

        Ok(CaptionResponse {
            text: caption.trim().to_string(),
            model: chat_resp.model.unwrap_or_else(|| self.model.clone()),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
