use super::{classify_http_failure, classify_transport_error, LLMClient, ModelPrompt};
use crate::domain::error::{AppError, ModelErrorKind, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: String,
}

pub struct GeminiClient {
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn normalize_model(model: &str) -> String {
        let trimmed = model.trim();
        let bare = trimmed.strip_prefix("models/").unwrap_or(trimmed);
        format!("models/{}", bare)
    }

    fn api_key(config: &LLMConfig) -> Result<String> {
        config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::model(
                    ModelErrorKind::AuthFailure,
                    "Missing API key for Gemini provider",
                )
            })
    }

    fn request_body(config: &LLMConfig, prompt: &ModelPrompt) -> GeminiRequest {
        let mut parts = Vec::new();
        if !prompt.user.trim().is_empty() {
            parts.push(GeminiPart::Text {
                text: prompt.user.clone(),
            });
        }
        for image in &prompt.images {
            parts.push(GeminiPart::Inline {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: STANDARD.encode(&image.data),
                },
            });
        }

        let system_instruction = if prompt.system.trim().is_empty() {
            None
        } else {
            Some(GeminiContent {
                parts: vec![GeminiPart::Text {
                    text: prompt.system.clone(),
                }],
                role: None,
            })
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                parts,
                role: Some("user".to_string()),
            }],
            system_instruction,
            generation_config: Some(GenerationConfig {
                temperature: config.temperature.unwrap_or(0.4) as f64,
                max_output_tokens: config.max_tokens,
                response_mime_type: "application/json",
            }),
        }
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, config: &LLMConfig, prompt: &ModelPrompt) -> Result<String> {
        let api_key = Self::api_key(config)?;
        let model_id = Self::normalize_model(&config.model);
        let base_url = config.base_url.trim_end_matches('/');
        let url = format!("{}/{}:generateContent", base_url, model_id);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
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
                Some(api_key.as_str()),
            ));
        }

        let json: GeminiResponse = response.json().await.map_err(|e| {
            AppError::model(
                ModelErrorKind::Unknown,
                format!("Failed to parse provider JSON: {}", e),
            )
        })?;

        let text: String = json
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::model(
                ModelErrorKind::Unknown,
                "Invalid response format: no candidate text",
            ));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation_request::ImageBlob;

    #[test]
    fn test_normalize_model_adds_single_prefix() {
        assert_eq!(GeminiClient::normalize_model("gemini-1.5-pro"), "models/gemini-1.5-pro");
        assert_eq!(
            GeminiClient::normalize_model("models/gemini-1.5-pro"),
            "models/gemini-1.5-pro"
        );
    }

    #[test]
    fn test_request_body_carries_inline_images() {
        let prompt = ModelPrompt::new("be strict", "screens").with_images(vec![ImageBlob {
            name: None,
            mime_type: "image/jpeg".to_string(),
            data: vec![0xff, 0xd8],
        }]);
        let body = serde_json::to_value(GeminiClient::request_body(&LLMConfig::default(), &prompt))
            .unwrap();
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be strict");
    }
}
