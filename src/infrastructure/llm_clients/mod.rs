pub mod gateway;
pub mod gemini;
pub mod openai;

use crate::domain::error::{AppError, ModelErrorKind, Result};
use crate::domain::generation_request::ImageBlob;
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use async_trait::async_trait;
use gemini::GeminiClient;
use openai::OpenAIClient;
use reqwest::StatusCode;

pub use gateway::{check_model_identifier, ModelGateway, StructuredReply};

/// One model invocation: instructions, user content and optional inline images.
#[derive(Debug, Clone, Default)]
pub struct ModelPrompt {
    pub system: String,
    pub user: String,
    pub images: Vec<ImageBlob>,
}

impl ModelPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<ImageBlob>) -> Self {
        self.images = images;
        self
    }
}

#[async_trait]
pub trait LLMClient {
    async fn generate(&self, config: &LLMConfig, prompt: &ModelPrompt) -> Result<String>;
}

pub struct RouterClient {
    openai: OpenAIClient,
    gemini: GeminiClient,
}

impl RouterClient {
    pub fn new() -> Self {
        Self {
            openai: OpenAIClient::new(),
            gemini: GeminiClient::new(),
        }
    }
}

impl Default for RouterClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for RouterClient {
    async fn generate(&self, config: &LLMConfig, prompt: &ModelPrompt) -> Result<String> {
        match config.provider {
            LLMProvider::Gemini => self.gemini.generate(config, prompt).await,
            LLMProvider::OpenAI => self.openai.generate(config, prompt).await,
        }
    }
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    if base_url.ends_with('/') {
        format!("{}{}", base_url, path)
    } else {
        format!("{}/{}", base_url, path)
    }
}

fn mask_credential(credential: Option<&str>) -> String {
    match credential.map(str::trim) {
        Some(key) if key.chars().count() > 8 => {
            let tail: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("credential ending in ...{}", tail)
        }
        Some(key) if !key.is_empty() => "credential <redacted>".to_string(),
        _ => "no credential".to_string(),
    }
}

fn mentions_missing_model(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("model_not_found")
        || (lower.contains("model")
            && (lower.contains("not found")
                || lower.contains("does not exist")
                || lower.contains("is not supported")
                || lower.contains("unknown model")
                || lower.contains("invalid model")))
}

/// Maps a non-success provider response onto the model error taxonomy.
pub fn classify_http_failure(
    status: StatusCode,
    body: &str,
    model: &str,
    credential: Option<&str>,
) -> AppError {
    let detail = body.trim();
    match status.as_u16() {
        401 | 403 => AppError::model(
            ModelErrorKind::AuthFailure,
            format!(
                "Provider rejected {} ({}): {}",
                mask_credential(credential),
                status,
                detail
            ),
        ),
        429 => AppError::model(
            ModelErrorKind::RateLimited,
            format!("Rate limited by provider ({}): {}", status, detail),
        ),
        404 => AppError::model(
            ModelErrorKind::ModelNotFound,
            format!("Model '{}' not found ({}): {}", model, status, detail),
        ),
        _ if mentions_missing_model(detail) => AppError::model(
            ModelErrorKind::ModelNotFound,
            format!("Model '{}' not found ({}): {}", model, status, detail),
        ),
        408 | 504 => AppError::model(
            ModelErrorKind::Timeout,
            format!("Provider timed out ({}): {}", status, detail),
        ),
        _ => AppError::model(
            ModelErrorKind::Unknown,
            format!("API error ({}): {}", status, detail),
        ),
    }
}

pub fn classify_transport_error(err: &reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::model(ModelErrorKind::Timeout, format!("Request timed out: {}", err))
    } else {
        AppError::model(ModelErrorKind::Unknown, format!("Request failed: {}", err))
    }
}
