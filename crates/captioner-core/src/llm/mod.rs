//! Vision API integration for caption generation.
//!
//! Provides a provider abstraction over the supported endpoint shapes
//! (OpenAI-style chat completions and DashScope multimodal generation), a
//! retry policy for transient failures, and [`CaptionClient`], which ties a
//! provider, prompt expansion, and retries into one call per image.

pub mod client;
pub mod dashscope;
pub mod openai;
pub mod provider;
pub mod retry;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{Caption, CaptionClient, CaptionOptions};
pub use provider::{
    CaptionProvider, CaptionRequest, CaptionResponse, ImageInput, ProviderFactory, ProviderKind,
    Quality,
};
pub use retry::RetryPolicy;
