use serde::{Deserialize, Serialize};
use std::fmt;

const RAW_PREVIEW_CHARS: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelErrorKind {
    AuthFailure,
    RateLimited,
    ModelNotFound,
    Timeout,
    Unknown,
}

impl ModelErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelErrorKind::AuthFailure => "auth_failure",
            ModelErrorKind::RateLimited => "rate_limited",
            ModelErrorKind::ModelNotFound => "model_not_found",
            ModelErrorKind::Timeout => "timeout",
            ModelErrorKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelError {
    pub kind: ModelErrorKind,
    pub message: String,
}

impl ModelError {
    pub fn new(kind: ModelErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Rate limits and timeouts are worth retrying; everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ModelErrorKind::RateLimited | ModelErrorKind::Timeout
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppError {
    InvalidInput(String),
    UpstreamFetch { url: String, message: String },
    Model(ModelError),
    SchemaViolation { message: String, raw: String },
    Config(String),
    Internal(String),
}

impl AppError {
    pub fn model(kind: ModelErrorKind, message: impl Into<String>) -> Self {
        AppError::Model(ModelError::new(kind, message))
    }

    pub fn schema_violation(message: impl Into<String>, raw: impl Into<String>) -> Self {
        AppError::SchemaViolation {
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn upstream_fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::UpstreamFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn model_kind(&self) -> Option<ModelErrorKind> {
        match self {
            AppError::Model(err) => Some(err.kind),
            _ => None,
        }
    }

    /// Whether the caller may retry the same request unchanged.
    /// A schema violation is recoverable: the model may conform on the next attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Model(err) => err.is_retryable(),
            AppError::SchemaViolation { .. } => true,
            _ => false,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::UpstreamFetch { .. } => "upstream_fetch_error",
            AppError::Model(err) => err.kind.as_str(),
            AppError::SchemaViolation { .. } => "schema_violation",
            AppError::Config(_) => "config_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::UpstreamFetch { url, message } => {
                write!(f, "Failed to fetch API spec from {}: {}", url, message)
            }
            AppError::Model(err) => write!(f, "Model error ({}): {}", err.kind.as_str(), err.message),
            AppError::SchemaViolation { message, raw } => {
                let preview: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
                write!(f, "Schema violation: {} | raw={}", message, preview)
            }
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
