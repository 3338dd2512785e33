//! Generation Pipeline
//!
//! Orchestrates one topic request end to end: session cache, store
//! short-circuit, fallback-controlled provider call (streaming or not),
//! incremental or direct parse, category resolution, and unification.
//!
//! Dropping the returned future abandons the in-flight provider call and any
//! partial buffer; an incomplete document is never persisted.

use futures::StreamExt;
use tracing::{info, warn};

use super::cache::TopicCache;
use super::merge::{MergeEngine, MergeRequest};
use crate::constants::generation::DEFAULT_ITEM_COUNT;
use crate::parser::{Snapshot, StreamParser, parse_payload};
use crate::provider::{FallbackController, SharedProvider};
use crate::store::{SetStore, SharedDatabase};
use crate::types::{FlashcardItem, GenerationPayload, Result};

/// One inbound generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Free-text topic (required)
    pub topic: String,
    /// Number of items to ask for
    pub count: usize,
    pub category_label: Option<String>,
    pub contributor_id: Option<String>,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            count: DEFAULT_ITEM_COUNT,
            category_label: None,
            contributor_id: None,
        }
    }
}

/// What the caller gets back. Generated items are always present on success,
/// even when persistence failed; `persistence_error` tells the operator that
/// storage broke, as opposed to the provider.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub normalized_topic: String,
    pub items: Vec<FlashcardItem>,
    pub category: Option<String>,
    /// Persisted record id; absent when persistence failed
    pub set_id: Option<String>,
    /// The record was served from the store without a provider call
    pub from_store: bool,
    /// Model that produced the content, when the provider was called
    pub model: Option<String>,
    pub persistence_error: Option<String>,
}

pub struct GenerationService {
    db: SharedDatabase,
    provider: SharedProvider,
    controller: FallbackController,
    language: String,
}

impl GenerationService {
    pub fn new(
        db: SharedDatabase,
        provider: SharedProvider,
        controller: FallbackController,
        language: impl Into<String>,
    ) -> Self {
        Self {
            db,
            provider,
            controller,
            language: language.into(),
        }
    }

    /// Non-streaming generation: one complete document from the provider.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cache: &mut TopicCache,
    ) -> Result<GenerationOutcome> {
        if let Some(existing) = self.short_circuit(request, cache)? {
            return Ok(existing);
        }

        let prompt = build_prompt(&request.topic, request.count, &self.language);
        let (text, model) = self
            .controller
            .generate(self.provider.as_ref(), &prompt)
            .await?;
        let payload = parse_payload(&text)?;

        Ok(self.reconcile(request, payload, Some(model), cache))
    }

    /// Streaming generation: snapshots are handed to `on_snapshot` as the
    /// document grows, each replacing the previous one.
    pub async fn generate_streaming(
        &self,
        request: &GenerationRequest,
        cache: &mut TopicCache,
        mut on_snapshot: impl FnMut(&Snapshot),
    ) -> Result<GenerationOutcome> {
        if let Some(existing) = self.short_circuit(request, cache)? {
            return Ok(existing);
        }

        let prompt = build_prompt(&request.topic, request.count, &self.language);
        let (mut stream, model) = self
            .controller
            .generate_stream(self.provider.as_ref(), &prompt)
            .await?;

        let mut parser = StreamParser::new();
        while let Some(chunk) = stream.next().await {
            let snapshot = parser.push(&chunk?);
            on_snapshot(&snapshot);
        }

        let payload = parser.finish()?;
        Ok(self.reconcile(request, payload, Some(model), cache))
    }

    /// Serve from cache or store without touching the provider.
    fn short_circuit(
        &self,
        request: &GenerationRequest,
        cache: &mut TopicCache,
    ) -> Result<Option<GenerationOutcome>> {
        let topic = request.topic.trim();

        if let Some(cached) = cache.get(topic) {
            info!(topic, "Serving from session cache");
            return Ok(Some(outcome_from_set(cached, true, None, None)));
        }

        let sets = SetStore::new(&self.db);
        if let Some(existing) = sets.find_by_topic_key(topic, topic)? {
            info!(topic, "Serving from store");
            cache.put(&existing.normalized_topic, existing.clone());
            return Ok(Some(outcome_from_set(&existing, true, None, None)));
        }

        Ok(None)
    }

    /// Post-generation unification. Store failures do not discard the
    /// generated content; they ride along as `persistence_error`.
    fn reconcile(
        &self,
        request: &GenerationRequest,
        payload: GenerationPayload,
        model: Option<String>,
        cache: &mut TopicCache,
    ) -> GenerationOutcome {
        let topic = request.topic.trim();
        let normalized_topic = {
            let norm = payload.normalized_topic.trim();
            if norm.is_empty() { topic } else { norm }.to_string()
        };

        // An explicit caller label wins over what the model suggested
        let label = request
            .category_label
            .as_deref()
            .or(payload.category.as_deref());

        let engine = MergeEngine::new(&self.db);
        let merge = engine.unify(MergeRequest {
            normalized_topic: &normalized_topic,
            original_topic: topic,
            items: payload.flashcards.clone(),
            category_label: label,
            contributor_id: request.contributor_id.as_deref(),
        });

        match merge {
            Ok(set) => {
                cache.put(&set.normalized_topic, set.clone());
                outcome_from_set(&set, false, model, None)
            }
            Err(e) => {
                warn!(topic, error = %e, "Generation succeeded but persistence failed");
                GenerationOutcome {
                    normalized_topic,
                    items: payload.flashcards,
                    category: payload.category,
                    set_id: None,
                    from_store: false,
                    model,
                    persistence_error: Some(e.to_string()),
                }
            }
        }
    }
}

fn outcome_from_set(
    set: &crate::types::FlashcardSet,
    from_store: bool,
    model: Option<String>,
    persistence_error: Option<String>,
) -> GenerationOutcome {
    GenerationOutcome {
        normalized_topic: set.normalized_topic.clone(),
        items: set.items.clone(),
        category: set.category.clone(),
        set_id: Some(set.id.clone()),
        from_store,
        model,
        persistence_error,
    }
}

fn build_prompt(topic: &str, count: usize, language: &str) -> String {
    format!(
        r#"Create {count} educational flashcards about the topic: "{topic}".
Language: {language}.
Return ONLY a raw JSON object.
Do not include markdown formatting (like ```json).
Do not include any introductory or concluding text.
Structure: {{"normalized_topic": "Canonical Title Case Topic", "category": "Short category label", "flashcards": [{{"front": "Question/Term", "back": "Answer/Definition"}}]}}"#
    )
}
