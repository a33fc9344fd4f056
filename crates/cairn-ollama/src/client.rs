// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a local Ollama server.
//!
//! Provides [`OllamaClient`] which handles JSON request construction,
//! timeout mapping, and one retry on transient server errors.

use std::time::Duration;

use cairn_core::CairnError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{ApiError, TagsResponse};

/// Thin JSON client bound to one Ollama base URL.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CairnError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CairnError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shortens the retry backoff (for tests against wiremock).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send_error(&self, e: reqwest::Error) -> CairnError {
        if e.is_timeout() {
            CairnError::Timeout {
                duration: self.timeout,
            }
        } else {
            CairnError::Provider {
                message: format!("Ollama request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }

    /// POST `body` as JSON to `path` and decode the JSON response.
    ///
    /// On transient statuses (429, 500, 502, 503) the request is retried once.
    pub async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, CairnError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.url(path);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, path, "retrying Ollama request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| self.send_error(e))?;

            let status = response.status();
            debug!(status = %status, attempt, path, "Ollama response received");

            if status.is_success() {
                let text = response.text().await.map_err(|e| self.send_error(e))?;
                return serde_json::from_str(&text).map_err(|e| CairnError::Provider {
                    message: format!("failed to parse Ollama response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiError>(&body) {
                Ok(api) => format!("Ollama returned {status}: {}", api.error),
                Err(_) => format!("Ollama returned {status}: {body}"),
            };

            if is_transient(status) && attempt < self.max_retries {
                warn!(status = %status, "transient Ollama error, will retry");
                last_error = Some(CairnError::provider(message));
                continue;
            }
            return Err(CairnError::provider(message));
        }

        Err(last_error.unwrap_or_else(|| CairnError::provider("Ollama request failed after retries")))
    }

    /// Names of the locally installed models (`GET /api/tags`).
    pub async fn list_models(&self) -> Result<Vec<String>, CairnError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CairnError::provider(format!("Ollama returned {status} listing models")));
        }
        let tags: TagsResponse = response.json().await.map_err(|e| self.send_error(e))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

fn is_transient(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}
