use crate::domain::error::{AppError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[async_trait]
pub trait ApiSpecFetcher {
    /// Returns the raw body of the document at `url`.
    async fn fetch(&self, url: &Url) -> Result<String>;
}

pub struct HttpApiSpecFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpApiSpecFetcher {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            max_bytes,
        }
    }
}

#[async_trait]
impl ApiSpecFetcher for HttpApiSpecFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        let mut response = self
            .client
            .get(url.clone())
            .header("Accept", "application/json, application/yaml, text/yaml, */*")
            .send()
            .await
            .map_err(|e| AppError::upstream_fetch(url.as_str(), format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream_fetch(
                url.as_str(),
                format!("Server answered {}", status),
            ));
        }

        let too_large = |size: u64| {
            AppError::upstream_fetch(
                url.as_str(),
                format!(
                    "Document of at least {} bytes exceeds the {} byte limit",
                    size, self.max_bytes
                ),
            )
        };
        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(too_large(length));
            }
        }

        // The declared length may be absent or wrong, so the limit is also
        // enforced while reading.
        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            AppError::upstream_fetch(url.as_str(), format!("Failed to read body: {}", e))
        })? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(too_large((bytes.len() + chunk.len()) as u64));
            }
            bytes.extend_from_slice(&chunk);
        }
        debug!(url = %url, bytes = bytes.len(), "Fetched API spec");

        String::from_utf8(bytes).map_err(|_| {
            AppError::upstream_fetch(url.as_str(), "Document is not valid UTF-8")
        })
    }
}
