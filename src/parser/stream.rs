//! Incremental Response Parser
//!
//! Consumes a stream of text chunks forming one JSON document of shape
//! `{normalized_topic, category?, flashcards: [{front, back}, ...]}`.
//!
//! After each chunk the accumulated buffer is re-parsed best-effort and a
//! snapshot of the fully-formed items is published. Each snapshot replaces
//! the previous one rather than appending: a trailing element's text may
//! still be revised mid-stream even while the list length is unchanged.
//! `push` returns immediately for the current buffer and never waits for
//! more input.

use serde_json::Value;

use super::partial::{parse_final, parse_partial};
use crate::types::{CardforgeError, FlashcardItem, GenerationPayload, Result};

/// A point-in-time view of the document as streamed so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Published independently as soon as it resolves
    pub normalized_topic: Option<String>,
    /// Only fully-formed entries: front and back present, string-typed,
    /// non-empty after trim
    pub items: Vec<FlashcardItem>,
}

/// Accumulating parser over one chunk stream.
#[derive(Debug, Default)]
pub struct StreamParser {
    buffer: String,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the snapshot for the grown buffer.
    pub fn push(&mut self, chunk: &str) -> Snapshot {
        self.buffer.push_str(chunk);
        self.snapshot()
    }

    /// Snapshot of the current buffer without appending anything.
    pub fn snapshot(&self) -> Snapshot {
        match parse_partial(&self.buffer) {
            Some(value) => extract_snapshot(&value),
            None => Snapshot::default(),
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Strict re-parse of the full buffer at stream end.
    ///
    /// Failure here fails the whole operation regardless of how many partial
    /// snapshots were published.
    pub fn finish(self) -> Result<GenerationPayload> {
        parse_payload(&self.buffer)
    }
}

/// Strict parse of a complete response text into the payload shape.
/// Shared by the streaming finalization and the non-streaming path.
pub fn parse_payload(text: &str) -> Result<GenerationPayload> {
    let value = parse_final(text)?;
    let payload: GenerationPayload = serde_json::from_value(value)
        .map_err(|e| CardforgeError::MalformedOutput(format!("unexpected document shape: {}", e)))?;

    if payload.flashcards.is_empty() {
        return Err(CardforgeError::MalformedOutput(
            "document contains no flashcards".to_string(),
        ));
    }

    Ok(payload)
}

fn extract_snapshot(value: &Value) -> Snapshot {
    let normalized_topic = value
        .get("normalized_topic")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let items = value
        .get("flashcards")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let front = entry.get("front")?.as_str()?;
                    let back = entry.get("back")?.as_str()?;
                    let item = FlashcardItem::new(front, back);
                    item.is_complete().then_some(item)
                })
                .collect()
        })
        .unwrap_or_default();

    Snapshot {
        normalized_topic,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const COMPLETE_DOC: &str = r#"{
        "normalized_topic": "Python Programming",
        "category": "Công nghệ",
        "flashcards": [
            {"front": "What is a list comprehension?", "back": "A concise way to build lists"},
            {"front": "What does GIL stand for?", "back": "Global Interpreter Lock"},
            {"front": "What is a decorator?", "back": "A callable that wraps another callable"}
        ]
    }"#;

    #[test]
    fn test_topic_published_early() {
        let mut parser = StreamParser::new();
        let snapshot = parser.push(r#"{"normalized_topic": "Python Programming", "flashcards": ["#);
        assert_eq!(snapshot.normalized_topic.as_deref(), Some("Python Programming"));
        assert!(snapshot.items.is_empty());
    }

    #[test]
    fn test_incomplete_trailing_item_excluded() {
        let mut parser = StreamParser::new();
        let snapshot = parser.push(
            r#"{"normalized_topic": "T", "flashcards": [{"front": "done", "back": "yes"}, {"front": "pending""#,
        );
        // The second entry has no back yet, so only the first is published
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].front, "done");
    }

    #[test]
    fn test_snapshot_replaces_not_appends() {
        let mut parser = StreamParser::new();
        let first = parser.push(r#"{"flashcards": [{"front": "q", "back": "par"#);
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].back, "par");

        // Same element, more text: still one item, with revised text
        let second = parser.push("tial answer");
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].back, "partial answer");
    }

    #[test]
    fn test_blank_sides_not_published() {
        let mut parser = StreamParser::new();
        let snapshot =
            parser.push(r#"{"flashcards": [{"front": "  ", "back": "a"}, {"front": "q", "back": "a"}]}"#);
        assert_eq!(snapshot.items.len(), 1);
    }

    #[test]
    fn test_finish_matches_direct_parse() {
        let mut parser = StreamParser::new();
        let chars: Vec<char> = COMPLETE_DOC.chars().collect();
        for chunk in chars.chunks(7) {
            parser.push(&chunk.iter().collect::<String>());
        }
        let streamed = parser.finish().unwrap();
        let direct = parse_payload(COMPLETE_DOC).unwrap();
        assert_eq!(streamed.normalized_topic, direct.normalized_topic);
        assert_eq!(streamed.flashcards, direct.flashcards);
    }

    #[test]
    fn test_finish_fails_on_truncated_stream() {
        let mut parser = StreamParser::new();
        let partial = &COMPLETE_DOC[..COMPLETE_DOC.len() / 2];
        let snapshot = parser.push(partial);
        assert!(!snapshot.items.is_empty());

        let err = parser.finish().unwrap_err();
        assert!(matches!(err, CardforgeError::MalformedOutput(_)));
    }

    #[test]
    fn test_parse_payload_rejects_empty_card_list() {
        let err = parse_payload(r#"{"normalized_topic": "T", "flashcards": []}"#).unwrap_err();
        assert!(matches!(err, CardforgeError::MalformedOutput(_)));
    }

    #[test]
    fn test_parse_payload_accepts_fenced_document() {
        let fenced = format!("```json\n{}\n```", COMPLETE_DOC);
        let payload = parse_payload(&fenced).unwrap();
        assert_eq!(payload.flashcards.len(), 3);
    }

    proptest! {
        /// For any well-formed document and any chunking of it, the final
        /// published item list equals a direct parse of the complete text:
        /// nothing lost or duplicated by the incremental path.
        #[test]
        fn prop_incremental_equals_direct(splits in proptest::collection::vec(1usize..40, 0..20)) {
            let direct = parse_payload(COMPLETE_DOC).unwrap();

            let mut parser = StreamParser::new();
            let mut last_snapshot = Snapshot::default();
            let mut remaining = COMPLETE_DOC;
            for size in splits {
                if remaining.is_empty() {
                    break;
                }
                let mut cut = size.min(remaining.len());
                while !remaining.is_char_boundary(cut) {
                    cut += 1;
                }
                let (chunk, rest) = remaining.split_at(cut);
                last_snapshot = parser.push(chunk);
                remaining = rest;
            }
            if !remaining.is_empty() {
                last_snapshot = parser.push(remaining);
            }

            prop_assert_eq!(&last_snapshot.items, &direct.flashcards);
            prop_assert_eq!(
                last_snapshot.normalized_topic.as_deref(),
                Some(direct.normalized_topic.as_str())
            );

            let streamed = parser.finish().unwrap();
            prop_assert_eq!(streamed.flashcards, direct.flashcards);
        }
    }
}
