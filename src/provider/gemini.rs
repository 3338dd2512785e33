//! Gemini API Provider
//!
//! HTTP provider for Google's Generative Language API, supporting both
//! complete-document generation and chunked streaming (SSE).
//! API keys are held as `SecretString` and never appear in debug output.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ChunkStream, GenerationProvider, ProviderError, ProviderErrorKind, ResponseEnvelope};
use crate::config::LlmConfig;
use crate::types::{CardforgeError, Result};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API provider with secure API key handling
pub struct GeminiProvider {
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                CardforgeError::Config(
                    "Gemini API key not found. Set GEMINI_API_KEY env var or provide in config"
                        .to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(
                crate::constants::network::CONNECTION_TIMEOUT_SECS,
            ))
            .build()
            .map_err(|e| CardforgeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base,
            client,
        })
    }

    fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}]
            }]
        })
    }

    async fn post(&self, url: &str, prompt: &str, model: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(
                    ProviderErrorKind::Other,
                    format!("request failed: {}", e),
                    model,
                )
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_http_status(status, body, model).into());
        }

        Ok(response)
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        info!(model, "Generating with Gemini");

        let url = format!("{}/models/{}:generateContent", self.api_base, model);
        let response = self.post(&url, prompt, model).await?;

        let value: Value = response.json().await.map_err(|e| {
            ProviderError::new(
                ProviderErrorKind::Other,
                format!("failed to read response body: {}", e),
                model,
            )
        })?;

        debug!(model, "Received Gemini response");
        ResponseEnvelope::text_of(&value).ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::Other, "empty response from model", model).into()
        })
    }

    async fn generate_stream(&self, model: &str, prompt: &str) -> Result<ChunkStream> {
        info!(model, "Streaming with Gemini");

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.api_base, model
        );
        let response = self.post(&url, prompt, model).await?;

        let model = model.to_string();
        let mut bytes = response.bytes_stream();

        let stream = try_stream! {
            let mut line_buf = String::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| {
                    CardforgeError::from(ProviderError::new(
                        ProviderErrorKind::Other,
                        format!("stream read failed: {}", e),
                        model.as_str(),
                    ))
                })?;
                line_buf.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = line_buf.find('\n') {
                    let line: String = line_buf.drain(..=pos).collect();
                    let line = line.trim();
                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data.is_empty() || data == "[DONE]" {
                        continue;
                    }
                    match serde_json::from_str::<Value>(data) {
                        Ok(value) => {
                            if let Some(text) = ResponseEnvelope::text_of(&value) {
                                yield text;
                            }
                        }
                        Err(e) => {
                            // A garbled SSE frame is skipped; the final strict
                            // parse decides whether the document survived.
                            warn!(model = %model, "Skipping unparseable stream frame: {}", e);
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
