//! Flashcard domain types.
//!
//! `FlashcardItem` identity is the case-insensitive trimmed front text.
//! Items are immutable: a duplicate is discarded whole, never merged
//! field-by-field, so historical phrasing survives near-duplicate rewrites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single flashcard: question/term on the front, answer/definition on the back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardItem {
    pub front: String,
    pub back: String,
}

impl FlashcardItem {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }

    /// Dedup key: case-insensitive trimmed front text.
    pub fn identity_key(&self) -> String {
        self.front.trim().to_lowercase()
    }

    /// Both sides present and non-empty after trim.
    pub fn is_complete(&self) -> bool {
        !self.front.trim().is_empty() && !self.back.trim().is_empty()
    }
}

/// Fold items into an identity-keyed ordered list, first occurrence wins.
pub fn fold_unique<I>(items: I) -> Vec<FlashcardItem>
where
    I: IntoIterator<Item = FlashcardItem>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.identity_key()) {
            out.push(item);
        }
    }
    out
}

/// The unified persistent record for one study topic.
///
/// Invariant: at most one live record per normalized topic (case-insensitive),
/// enforced by lookup-before-write. Creation races under concurrent load leave
/// transient duplicates that the consolidation job folds back together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardSet {
    pub id: String,
    /// Original free-text topic from the first request
    pub topic: String,
    /// Canonical Title-Case dedup key
    pub normalized_topic: String,
    /// Unique-by-identity ordered item list
    pub items: Vec<FlashcardItem>,
    /// Set semantics: every party that contributed content to this record
    pub contributor_ids: Vec<String>,
    /// Set semantics: every original topic string known to map here
    pub aliases: Vec<String>,
    pub category: Option<String>,
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlashcardSet {
    pub fn new(topic: impl Into<String>, normalized_topic: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic: topic.into(),
            normalized_topic: normalized_topic.into(),
            items: Vec::new(),
            contributor_ids: Vec::new(),
            aliases: Vec::new(),
            category: None,
            category_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Grouping key for dedup lookups and consolidation: the normalized topic,
    /// falling back to the raw topic when normalization is missing.
    pub fn topic_key(&self) -> String {
        let norm = self.normalized_topic.trim();
        if norm.is_empty() {
            self.topic.trim().to_lowercase()
        } else {
            norm.to_lowercase()
        }
    }
}

/// The one JSON document shape the provider produces, streaming or not:
/// `{normalized_topic, category?, flashcards: [{front, back}, ...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationPayload {
    pub normalized_topic: String,
    #[serde(default)]
    pub category: Option<String>,
    pub flashcards: Vec<FlashcardItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_case_insensitive() {
        let a = FlashcardItem::new("What is a Promise?", "a");
        let b = FlashcardItem::new("  what is a promise?  ", "b");
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_is_complete() {
        assert!(FlashcardItem::new("q", "a").is_complete());
        assert!(!FlashcardItem::new("q", "   ").is_complete());
        assert!(!FlashcardItem::new("", "a").is_complete());
    }

    #[test]
    fn test_fold_unique_first_wins() {
        let folded = fold_unique(vec![
            FlashcardItem::new("What is a promise?", "original answer"),
            FlashcardItem::new("What is a Promise?", "rewritten answer"),
            FlashcardItem::new("New question", "new answer"),
        ]);
        assert_eq!(folded.len(), 2);
        assert_eq!(folded[0].back, "original answer");
        assert_eq!(folded[1].front, "New question");
    }

    #[test]
    fn test_topic_key_falls_back_to_topic() {
        let mut set = FlashcardSet::new("  Rust Ownership ", "");
        assert_eq!(set.topic_key(), "rust ownership");
        set.normalized_topic = "Rust Ownership".into();
        assert_eq!(set.topic_key(), "rust ownership");
    }

    #[test]
    fn test_payload_deserializes_without_category() {
        let payload: GenerationPayload = serde_json::from_str(
            r#"{"normalized_topic": "Rust", "flashcards": [{"front": "q", "back": "a"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.normalized_topic, "Rust");
        assert!(payload.category.is_none());
        assert_eq!(payload.flashcards.len(), 1);
    }
}
