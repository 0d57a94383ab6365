use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum LLMProvider {
    /// Any endpoint speaking the OpenAI chat-completions protocol (OpenAI, OpenRouter, LM Studio).
    #[default]
    OpenAI,
    Gemini,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    #[serde(default)]
    pub provider: LLMProvider,
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl LLMConfig {
    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }

    /// Applies per-request overrides on top of this configuration.
    pub fn overridden_by(&self, overrides: &ModelAccess) -> LLMConfig {
        LLMConfig {
            provider: overrides.provider.unwrap_or(self.provider),
            base_url: overrides
                .base_url
                .clone()
                .unwrap_or_else(|| self.base_url.clone()),
            model: overrides.model.clone().unwrap_or_else(|| self.model.clone()),
            api_key: overrides
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
                .or_else(|| self.api_key.clone()),
            max_tokens: overrides.max_tokens.or(self.max_tokens),
            temperature: overrides.temperature.or(self.temperature),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_tokens: Some(4096),
            temperature: Some(0.4),
        }
    }
}

/// Model access as supplied by a caller; every field is optional.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelAccess {
    pub provider: Option<LLMProvider>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}
