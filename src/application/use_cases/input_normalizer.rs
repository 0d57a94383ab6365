//! Turns caller input of any of the three kinds into a `RequestInput`.

use crate::domain::error::{AppError, Result};
use crate::domain::generation_request::{
    ApiSpec, GenerationRequest, GenerationSettings, ImageBlob, InputKind, RawImage, RawInput,
    RequestInput,
};
use crate::infrastructure::api_spec::ApiSpecFetcher;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;
use validator::Validate;

const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

#[derive(Debug, Clone, Copy)]
pub struct InputLimits {
    pub max_image_payload_bytes: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_image_payload_bytes: 20 * 1024 * 1024,
        }
    }
}

pub struct InputNormalizer {
    fetcher: Arc<dyn ApiSpecFetcher + Send + Sync>,
    limits: InputLimits,
}

impl InputNormalizer {
    pub fn new(fetcher: Arc<dyn ApiSpecFetcher + Send + Sync>, limits: InputLimits) -> Self {
        Self { fetcher, limits }
    }

    /// Validates settings and normalizes the input into a request.
    pub async fn build_request(
        &self,
        raw: &RawInput,
        settings: GenerationSettings,
    ) -> Result<GenerationRequest> {
        settings
            .validate()
            .map_err(|errors| AppError::InvalidInput(format!("Invalid settings: {}", errors)))?;
        let input = self.normalize(raw).await?;
        Ok(GenerationRequest { input, settings })
    }

    /// Reads only the field selected by `raw.kind`; the others are ignored.
    pub async fn normalize(&self, raw: &RawInput) -> Result<RequestInput> {
        log_ignored_fields(raw);
        match raw.kind {
            InputKind::Text => normalize_text(raw.criteria.as_deref()),
            InputKind::ImageSet => {
                let images = raw.images.as_deref().unwrap_or_default();
                self.normalize_images(images)
            }
            InputKind::ApiSpec => {
                let url = raw.api_spec_url.as_deref().unwrap_or_default();
                self.normalize_api_spec(url).await
            }
        }
    }

    fn normalize_images(&self, images: &[RawImage]) -> Result<RequestInput> {
        if images.is_empty() {
            return Err(AppError::InvalidInput(
                "Image set input requires at least one image.".to_string(),
            ));
        }

        let mut accepted = Vec::new();
        let mut total_bytes = 0usize;
        for (index, raw) in images.iter().enumerate() {
            let Some(blob) = decode_image(raw) else {
                warn!(
                    index,
                    name = raw.name.as_deref().unwrap_or("<unnamed>"),
                    "Skipping element that is not a recognized image"
                );
                continue;
            };
            total_bytes += blob.data.len();
            if total_bytes > self.limits.max_image_payload_bytes {
                return Err(AppError::InvalidInput(format!(
                    "Image payload exceeds the {} byte limit.",
                    self.limits.max_image_payload_bytes
                )));
            }
            accepted.push(blob);
        }

        if accepted.is_empty() {
            return Err(AppError::InvalidInput(
                "None of the supplied files is a recognized image type.".to_string(),
            ));
        }
        debug!(images = accepted.len(), total_bytes, "Normalized image set");
        Ok(RequestInput::ImageSet { images: accepted })
    }

    async fn normalize_api_spec(&self, raw_url: &str) -> Result<RequestInput> {
        let trimmed = raw_url.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput(
                "API spec input requires a URL.".to_string(),
            ));
        }
        let url = Url::parse(trimmed)
            .map_err(|e| AppError::InvalidInput(format!("Invalid API spec URL '{}': {}", trimmed, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::InvalidInput(format!(
                "API spec URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        let body = self.fetcher.fetch(&url).await?;
        let spec = parse_api_spec(url.as_str(), &body)?;
        debug!(url = %url, endpoints = spec.endpoints.len(), "Normalized API spec");
        Ok(RequestInput::ApiSpec { spec })
    }
}

pub fn normalize_text(criteria: Option<&str>) -> Result<RequestInput> {
    let criteria = criteria.map(str::trim).unwrap_or_default();
    if criteria.is_empty() {
        return Err(AppError::InvalidInput(
            "Requirement text must not be empty.".to_string(),
        ));
    }
    Ok(RequestInput::Text {
        criteria: criteria.to_string(),
    })
}

fn log_ignored_fields(raw: &RawInput) {
    let ignored: Vec<&str> = [
        (InputKind::Text, raw.criteria.is_some(), "criteria"),
        (InputKind::ImageSet, raw.images.is_some(), "images"),
        (InputKind::ApiSpec, raw.api_spec_url.is_some(), "apiSpecUrl"),
    ]
    .into_iter()
    .filter(|(kind, present, _)| *present && *kind != raw.kind)
    .map(|(_, _, name)| name)
    .collect();
    if !ignored.is_empty() {
        debug!(kind = raw.kind.as_str(), ignored = ?ignored, "Ignoring fields of other input kinds");
    }
}

fn decode_image(raw: &RawImage) -> Option<ImageBlob> {
    let payload = raw.data.trim();
    let payload = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(&compact)
        .or_else(|_| STANDARD_NO_PAD.decode(&compact))
        .ok()?;
    let format = image::guess_format(&bytes).ok()?;

    Some(ImageBlob {
        name: raw.name.clone(),
        mime_type: format.to_mime_type().to_string(),
        data: bytes,
    })
}

/// Parses an OpenAPI/Swagger document given as JSON or YAML.
pub fn parse_api_spec(url: &str, body: &str) -> Result<ApiSpec> {
    let document: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => serde_yaml::from_str(body).map_err(|e| {
            AppError::upstream_fetch(url, format!("Document is neither JSON nor YAML: {}", e))
        })?,
    };

    let Some(object) = document.as_object() else {
        return Err(AppError::upstream_fetch(
            url,
            "Document is not an API description object",
        ));
    };
    if !["openapi", "swagger", "paths"]
        .iter()
        .any(|key| object.contains_key(*key))
    {
        return Err(AppError::upstream_fetch(
            url,
            "Document has no openapi, swagger or paths entry",
        ));
    }

    let info = object.get("info");
    let title = info
        .and_then(|info| info.get("title"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let version = info
        .and_then(|info| info.get("version"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let endpoints = list_endpoints(&document);

    Ok(ApiSpec {
        source_url: url.to_string(),
        title,
        version,
        document,
        endpoints,
    })
}

fn list_endpoints(document: &Value) -> Vec<String> {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut endpoints = Vec::new();
    for (path, item) in paths {
        let Some(operations) = item.as_object() else {
            continue;
        };
        for (method, operation) in operations {
            if !HTTP_METHODS.contains(&method.to_ascii_lowercase().as_str()) {
                continue;
            }
            let summary = operation
                .get("summary")
                .or_else(|| operation.get("description"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty());
            let line = match summary {
                Some(summary) => format!("{} {} - {}", method.to_uppercase(), path, summary),
                None => format!("{} {}", method.to_uppercase(), path),
            };
            endpoints.push(line);
        }
    }
    endpoints.sort();
    endpoints
}
