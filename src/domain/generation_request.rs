use serde::{Deserialize, Serialize};
use validator::Validate;

use super::test_case::{Notation, Priority, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputKind {
    Text,
    ImageSet,
    ApiSpec,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::ImageSet => "imageSet",
            InputKind::ApiSpec => "apiSpec",
        }
    }
}

/// A decoded image whose format was sniffed from its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub name: Option<String>,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A fetched and parsed API description (OpenAPI/Swagger, JSON or YAML).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSpec {
    pub source_url: String,
    pub title: Option<String>,
    pub version: Option<String>,
    pub document: serde_json::Value,
    /// `METHOD /path - summary` lines, sorted.
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestInput {
    Text { criteria: String },
    ImageSet { images: Vec<ImageBlob> },
    ApiSpec { spec: ApiSpec },
}

impl RequestInput {
    pub fn kind(&self) -> InputKind {
        match self {
            RequestInput::Text { .. } => InputKind::Text,
            RequestInput::ImageSet { .. } => InputKind::ImageSet,
            RequestInput::ApiSpec { .. } => InputKind::ApiSpec,
        }
    }

    /// One-line description used in logs and the request digest.
    pub fn summary(&self) -> String {
        match self {
            RequestInput::Text { criteria } => {
                format!("text chars={} {}", criteria.chars().count(), criteria)
            }
            RequestInput::ImageSet { images } => {
                let bytes: usize = images.iter().map(|image| image.data.len()).sum();
                format!("images count={} bytes={}", images.len(), bytes)
            }
            RequestInput::ApiSpec { spec } => format!(
                "api_spec url={} endpoints={}",
                spec.source_url,
                spec.endpoints.len()
            ),
        }
    }
}

fn default_language() -> String {
    "English".to_string()
}

fn default_test_type() -> String {
    "Functional".to_string()
}

fn default_coverage_focus() -> String {
    "AllPaths".to_string()
}

fn default_refinement_rounds() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    #[serde(default)]
    pub output_notation: Notation,
    #[serde(default = "default_language")]
    #[validate(length(min = 1, max = 64))]
    pub language: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default = "default_test_type")]
    #[validate(length(min = 1, max = 64))]
    pub test_type: String,
    #[serde(default = "default_coverage_focus")]
    #[validate(length(min = 1, max = 64))]
    pub coverage_focus: String,
    #[serde(default = "default_refinement_rounds")]
    #[validate(range(min = 1, max = 5))]
    pub refinement_rounds: u8,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            output_notation: Notation::default(),
            language: default_language(),
            priority: Priority::default(),
            severity: Severity::default(),
            test_type: default_test_type(),
            coverage_focus: default_coverage_focus(),
            refinement_rounds: default_refinement_rounds(),
        }
    }
}

/// Exactly one input variant plus fully-populated settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub input: RequestInput,
    pub settings: GenerationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawImage {
    #[serde(default)]
    pub name: Option<String>,
    /// Informational only; the actual format is sniffed from the bytes.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Base64 payload or a `data:<mime>;base64,<payload>` URL.
    pub data: String,
}

/// Caller-supplied input before normalization. `kind` decides which field is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInput {
    pub kind: InputKind,
    #[serde(default)]
    pub criteria: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<RawImage>>,
    #[serde(default)]
    pub api_spec_url: Option<String>,
}

impl RawInput {
    pub fn text(criteria: impl Into<String>) -> Self {
        Self {
            kind: InputKind::Text,
            criteria: Some(criteria.into()),
            images: None,
            api_spec_url: None,
        }
    }
}
