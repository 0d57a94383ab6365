use crate::domain::error::Result;
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const CONFIG_FILE: &str = "caseforge.toml";
pub const ENV_PREFIX: &str = "CASEFORGE_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

/// Default model access, used for any field a request leaves out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSettings {
    pub provider: LLMProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let llm = LLMConfig::default();
        Self {
            provider: llm.provider,
            base_url: llm.base_url,
            model: llm.model,
            api_key: llm.api_key,
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            timeout_secs: 120,
        }
    }
}

impl ModelSettings {
    pub fn llm_config(&self) -> LLMConfig {
        LLMConfig {
            provider: self.provider,
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone().filter(|key| !key.trim().is_empty()),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitsConfig {
    pub max_image_payload_bytes: usize,
    pub max_api_spec_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_payload_bytes: 20 * 1024 * 1024,
            max_api_spec_bytes: 5 * 1024 * 1024,
        }
    }
}

impl LimitsConfig {
    /// Largest JSON request body accepted: the image ceiling after base64
    /// expansion, plus 1 MiB for the rest of the request.
    pub fn max_request_body_bytes(&self) -> usize {
        self.max_image_payload_bytes
            .saturating_mul(4)
            .div_ceil(3)
            .saturating_add(1024 * 1024)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverageConfig {
    pub min_term_length: usize,
    pub extra_stop_words: Vec<String>,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            min_term_length: 4,
            extra_stop_words: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelSettings,
    pub limits: LimitsConfig,
    pub coverage: CoverageConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            model: ModelSettings::default(),
            limits: LimitsConfig::default(),
            coverage: CoverageConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `caseforge.toml`, then `CASEFORGE_*` variables
    /// (`CASEFORGE_MODEL__API_KEY` sets `model.api_key`).
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::figment().extract().map_err(Into::into)
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
