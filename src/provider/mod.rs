//! Generation Provider Abstraction
//!
//! Defines the `GenerationProvider` trait for flashcard text generation,
//! streaming and non-streaming.
//!
//! ## Modules
//!
//! - `fallback`: model fallback controller with rotate-or-abort routing
//! - `gemini`: concrete HTTP provider for the Gemini API
//! - `retry`: pure retry policy and countdown state machine

mod fallback;
mod gemini;
mod retry;

pub use fallback::FallbackController;
pub use gemini::GeminiProvider;
pub use retry::{RetryPhase, RetryPolicy, RetryState};

// Re-export error types from centralized location
pub use crate::types::{ProviderError, ProviderErrorKind};

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Deserialize;

use crate::types::Result;

/// A live stream of text chunks eventually forming one JSON document.
pub type ChunkStream = BoxStream<'static, Result<String>>;

/// Shared provider type for concurrent access across requests.
pub type SharedProvider = Arc<dyn GenerationProvider>;

/// Content generation provider.
///
/// Failures surface as [`crate::types::CardforgeError::Provider`] carrying a
/// [`ProviderErrorKind`] so the fallback controller can distinguish
/// rate-limit/availability failures (rotate) from everything else (abort).
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate the complete response text with the named model.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;

    /// Generate a live chunk stream with the named model.
    async fn generate_stream(&self, model: &str, prompt: &str) -> Result<ChunkStream>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

// =============================================================================
// Response Envelope
// =============================================================================

/// Known provider response envelopes.
///
/// Upstream SDK versions have shipped the generated text either as a
/// top-level `text` field or nested under `candidates[].content.parts[]`.
/// Both shapes are resolved here, once, at the provider boundary; downstream
/// code only ever sees the flat text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Candidates { candidates: Vec<Candidate> },
    Flat { text: String },
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: CandidateContent,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: String,
}

impl ResponseEnvelope {
    /// Flatten the envelope to its generated text, if any.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Flat { text } => {
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            Self::Candidates { candidates } => {
                let text: String = candidates
                    .into_iter()
                    .flat_map(|c| c.content.parts)
                    .map(|p| p.text)
                    .collect();
                if text.is_empty() { None } else { Some(text) }
            }
        }
    }

    /// Resolve the text out of a raw JSON response value.
    pub fn text_of(value: &serde_json::Value) -> Option<String> {
        serde_json::from_value::<ResponseEnvelope>(value.clone())
            .ok()
            .and_then(Self::into_text)
    }
}
