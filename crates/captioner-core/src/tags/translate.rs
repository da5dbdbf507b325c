//! Tag translation through a text chat completion endpoint.

use crate::error::{ApiError, ApiResult, TagError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model used for tag translation.
pub const TRANSLATION_MODEL: &str = "gpt-3.5-turbo";

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate tags, one output per input where possible.
    async fn translate(&self, tags: &[String]) -> ApiResult<Vec<String>>;
}

/// Translates tags to Chinese with an OpenAI-compatible chat endpoint.
pub struct ChatTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ChatTranslator {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: TRANSLATION_MODEL.to_string(),
            timeout,
        }
    }
}

#[derive(Serialize)]
struct TextChatRequest<'a> {
    model: &'a str,
    messages: Vec<TextMessage>,
}

#[derive(Serialize)]
struct TextMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct TextChatResponse {
    #[serde(default)]
    choices: Vec<TextChoice>,
    error: Option<TextError>,
}

#[derive(Deserialize)]
struct TextChoice {
    message: TextChoiceMessage,
}

#[derive(Deserialize)]
struct TextChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct TextError {
    message: String,
}

fn translation_prompt(tags: &[String]) -> String {
    format!(
        "Translate each of the following image tags into Chinese. \
         Reply with exactly one translation per line, in the same order, with no numbering.\n{}",
        tags.join("\n")
    )
}

#[async_trait]
impl Translator for ChatTranslator {
    async fn translate(&self, tags: &[String]) -> ApiResult<Vec<String>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let body = TextChatRequest {
            model: &self.model,
            messages: vec![TextMessage {
                role: "user",
                content: translation_prompt(tags),
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

        let parsed: TextChatResponse = serde_json::from_str(&text).map_err(|e| ApiError::Parse {
            message: e.to_string(),
            body: text.clone(),
        })?;
        if let Some(error) = parsed.error {
            return Err(ApiError::Provider(error.message));
        }
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ApiError::Parse {
                message: "response has no choices[0].message.content".to_string(),
                body: text.clone(),
            })?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Translate `tags`, padding or trimming the result to the same length.
pub async fn translate_tags(
    translator: &dyn Translator,
    tags: &[String],
) -> Result<Vec<String>, TagError> {
    let mut translations = translator.translate(tags).await?;
    if translations.len() != tags.len() {
        tracing::warn!(
            "Translator returned {} line(s) for {} tag(s)",
            translations.len(),
            tags.len()
        );
    }
    translations.resize(tags.len(), String::new());
    Ok(translations)
}
