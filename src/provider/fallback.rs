//! Model Fallback Controller
//!
//! Drives one generation attempt per candidate in a deployment-configured
//! priority list. Rate-limit and availability failures rotate to the next
//! candidate after a fixed pause; any other failure aborts immediately
//! without rotating. Exhausting the list yields
//! [`CardforgeError::ProviderExhausted`] carrying the last error, which batch
//! callers treat as a circuit breaker: one exhausted request stops the rest
//! of the batch instead of burning an already-spent quota.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{ChunkStream, GenerationProvider};
use crate::types::{CardforgeError, ProviderError, ProviderErrorKind, Result};

/// Ordered model candidates plus rotation pacing.
#[derive(Debug, Clone)]
pub struct FallbackController {
    candidates: Vec<String>,
    rotation_delay: Duration,
}

impl FallbackController {
    pub fn new(candidates: Vec<String>, rotation_delay: Duration) -> Self {
        Self {
            candidates,
            rotation_delay,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Run a non-streaming generation across the candidate list.
    /// Returns the response text and the model that produced it.
    pub async fn generate(
        &self,
        provider: &dyn GenerationProvider,
        prompt: &str,
    ) -> Result<(String, String)> {
        self.drive(|model| {
            let model = model.to_string();
            async move {
                let text = provider.generate(&model, prompt).await?;
                Ok((text, model))
            }
        })
        .await
    }

    /// Open a streaming generation across the candidate list.
    /// Rotation only applies to the opening call; once a stream is live,
    /// chunk-level failures surface to the consumer unrotated.
    pub async fn generate_stream(
        &self,
        provider: &dyn GenerationProvider,
        prompt: &str,
    ) -> Result<(ChunkStream, String)> {
        self.drive(|model| {
            let model = model.to_string();
            async move {
                let stream = provider.generate_stream(&model, prompt).await?;
                Ok((stream, model))
            }
        })
        .await
    }

    async fn drive<T, F, Fut>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut(&str) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.candidates.is_empty() {
            return Err(CardforgeError::Config(
                "No model candidates configured".to_string(),
            ));
        }

        let mut last_error: Option<ProviderError> = None;

        for (idx, model) in self.candidates.iter().enumerate() {
            debug!(model = %model, position = idx, "Fallback attempt");

            match attempt(model.as_str()).await {
                Ok(value) => {
                    info!(model = %model, rotations = idx, "Generation succeeded");
                    return Ok(value);
                }
                Err(CardforgeError::Provider(err)) if err.rotates() => {
                    warn!(
                        model = %model,
                        kind = %err.kind,
                        "Candidate failed, rotating to next"
                    );
                    last_error = Some(err);
                    if !self.rotation_delay.is_zero() && idx + 1 < self.candidates.len() {
                        sleep(self.rotation_delay).await;
                    }
                }
                Err(err) => {
                    warn!(model = %model, error = %err, "Fatal provider error, aborting");
                    return Err(err);
                }
            }
        }

        let last = last_error.unwrap_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::Other,
                "no candidate produced a classifiable error",
                "unknown",
            )
        });
        Err(CardforgeError::ProviderExhausted { last })
    }
}
