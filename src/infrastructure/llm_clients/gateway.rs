//! The only path to the external model service.
//!
//! Every call is bounded by a timeout and, for structured calls, the reply
//! must contain a parseable JSON payload. No retries happen here.

use super::{LLMClient, ModelPrompt};
use crate::domain::error::{AppError, ModelErrorKind, Result};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::response::{clean_llm_response, extract_json_payload};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(120);

static KNOWN_MODEL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(models/)?(gpt-[\w.\-]+|o[134](-[\w.\-]+)?|chatgpt-[\w.\-]+|gemini-[\w.\-]+|claude-[\w.\-]+|llama[\w.\-]*|mistral[\w.\-]*|mixtral[\w.\-]*|qwen[\w.\-]*|deepseek[\w.\-]*|[\w.\-]+/[\w.\-:]+)$",
    )
    .unwrap()
});

/// Returns a warning for identifiers outside the usual vendor naming schemes.
/// Unknown names are still used as given.
pub fn check_model_identifier(model: &str) -> Option<String> {
    let trimmed = model.trim();
    if trimmed.is_empty() {
        return Some("Model identifier is empty".to_string());
    }
    if KNOWN_MODEL_PATTERN.is_match(trimmed) {
        None
    } else {
        Some(format!(
            "Model identifier '{}' does not match a known naming pattern",
            trimmed
        ))
    }
}

/// A model reply that parsed as JSON, with the raw text kept for diagnostics.
#[derive(Debug, Clone)]
pub struct StructuredReply {
    pub value: serde_json::Value,
    pub raw: String,
}

#[derive(Clone)]
pub struct ModelGateway {
    client: Arc<dyn LLMClient + Send + Sync>,
    timeout: Duration,
}

impl ModelGateway {
    pub fn new(client: Arc<dyn LLMClient + Send + Sync>) -> Self {
        Self {
            client,
            timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn invoke_text(&self, config: &LLMConfig, prompt: &ModelPrompt) -> Result<String> {
        debug!(
            model = %config.model,
            system_chars = prompt.system.len(),
            user_chars = prompt.user.len(),
            images = prompt.images.len(),
            "Invoking model"
        );

        match tokio::time::timeout(self.timeout, self.client.generate(config, prompt)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(model = %config.model, timeout_secs = self.timeout.as_secs(), "Model call timed out");
                Err(AppError::model(
                    ModelErrorKind::Timeout,
                    format!(
                        "Model '{}' did not answer within {}s",
                        config.model,
                        self.timeout.as_secs()
                    ),
                ))
            }
        }
    }

    /// Invokes the model and requires the reply to carry a JSON payload.
    pub async fn invoke_structured(
        &self,
        config: &LLMConfig,
        prompt: &ModelPrompt,
    ) -> Result<StructuredReply> {
        let raw = self.invoke_text(config, prompt).await?;
        let cleaned = clean_llm_response(&raw);
        match extract_json_payload(&cleaned) {
            Some(value) => Ok(StructuredReply { value, raw }),
            None => Err(AppError::schema_violation(
                "Model reply contains no parseable JSON payload",
                raw,
            )),
        }
    }
}
