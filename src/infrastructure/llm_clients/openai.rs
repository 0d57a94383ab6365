use super::{classify_http_failure, classify_transport_error, endpoint, LLMClient, ModelPrompt};
use crate::domain::error::{AppError, ModelErrorKind, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};

pub struct OpenAIClient {
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn user_content(prompt: &ModelPrompt) -> Value {
        if prompt.images.is_empty() {
            return Value::String(prompt.user.clone());
        }

        let mut parts = vec![json!({ "type": "text", "text": prompt.user })];
        for image in &prompt.images {
            let data_url = format!(
                "data:{};base64,{}",
                image.mime_type,
                STANDARD.encode(&image.data)
            );
            parts.push(json!({
                "type": "image_url",
                "image_url": { "url": data_url }
            }));
        }
        Value::Array(parts)
    }

    pub(crate) fn request_body(config: &LLMConfig, prompt: &ModelPrompt) -> Value {
        json!({
            "model": config.model,
            "messages": [
                {
                    "role": "system",
                    "content": prompt.system
                },
                {
                    "role": "user",
                    "content": Self::user_content(prompt)
                }
            ],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
        })
    }
}

impl Default for OpenAIClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate(&self, config: &LLMConfig, prompt: &ModelPrompt) -> Result<String> {
        let url = endpoint(&config.base_url, "chat/completions");

        let mut request = self.client.post(&url);
        if let Some(api_key) = config.api_key.as_deref().filter(|key| !key.trim().is_empty()) {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .json(&Self::request_body(config, prompt))
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(
                status,
                &text,
                &config.model,
                config.api_key.as_deref(),
            ));
        }

        let json: Value = response.json().await.map_err(|e| {
            AppError::model(
                ModelErrorKind::Unknown,
                format!("Failed to parse provider JSON: {}", e),
            )
        })?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AppError::model(
                    ModelErrorKind::Unknown,
                    "Invalid response format: missing choices[0].message.content",
                )
            })
    }
}
