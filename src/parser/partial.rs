//! Best-Effort Partial JSON Parsing
//!
//! A pure function from a growing text buffer to the best structural value
//! it currently represents, tolerant of truncation: unterminated strings,
//! unclosed arrays and objects, a dangling trailing comma, an unfinished
//! markdown code fence. Independent of any stream plumbing.
//!
//! The strict counterpart, [`parse_final`], accepts only a complete document
//! (after fence stripping and embedded-document extraction) and is what
//! decides whether a finished stream actually produced valid output.

use serde_json::Value;

use crate::types::{CardforgeError, Result};

/// Best-effort parse of a possibly-truncated buffer.
///
/// Returns `None` while the buffer holds nothing structurally usable yet.
pub fn parse_partial(buffer: &str) -> Option<Value> {
    let cleaned = preprocess(buffer);
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return Some(value);
    }

    let repaired = balance_brackets(&strip_dangling_comma(&close_open_strings(&cleaned)));
    serde_json::from_str::<Value>(&repaired).ok()
}

/// Strict parse of the complete buffer.
///
/// Fence stripping and embedded-document extraction are applied (models wrap
/// documents in markdown or prose), but no truncation repair: a cut-off
/// stream fails here no matter how many partial snapshots it produced.
pub fn parse_final(buffer: &str) -> Result<Value> {
    let cleaned = preprocess(buffer);

    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(value);
    }

    if let Some(embedded) = extract_embedded(&cleaned)
        && let Ok(value) = serde_json::from_str::<Value>(&embedded)
    {
        return Ok(value);
    }

    Err(CardforgeError::MalformedOutput(format!(
        "final parse failed; content preview: {}",
        cleaned.chars().take(200).collect::<String>()
    )))
}

/// Strip markdown fences, BOM, and surrounding whitespace.
fn preprocess(raw: &str) -> String {
    let mut s = raw.trim_start_matches('\u{feff}').trim();

    if let Some(rest) = s.strip_prefix("```") {
        // Drop the fence line; the language tag may still be mid-stream
        s = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => "",
        };
    }

    let mut s = s.trim_end().to_string();
    if s.ends_with("```") {
        s.truncate(s.len() - 3);
    }

    s.trim().to_string()
}

/// Close an unterminated string at a raw newline or at the buffer end.
/// Raw newlines are invalid inside JSON strings, so closing there never
/// corrupts a legitimate value.
fn close_open_strings(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 1);
    let mut in_string = false;
    let mut escape = false;

    for ch in s.chars() {
        if escape {
            escape = false;
            result.push(ch);
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape = true;
                result.push(ch);
            }
            '"' => {
                in_string = !in_string;
                result.push(ch);
            }
            '\n' | '\r' if in_string => {
                result.push('"');
                in_string = false;
                result.push(ch);
            }
            _ => result.push(ch),
        }
    }

    // Buffer ended mid-escape: drop the dangling backslash before closing
    if escape {
        result.pop();
    }
    if in_string {
        result.push('"');
    }

    result
}

/// Remove a trailing comma left dangling before the truncation point or a
/// closing bracket.
fn strip_dangling_comma(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let chars: Vec<char> = s.chars().collect();
    let mut in_string = false;
    let mut escape = false;

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];

        if escape {
            escape = false;
            result.push(ch);
            i += 1;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape = true;
                result.push(ch);
            }
            '"' => {
                in_string = !in_string;
                result.push(ch);
            }
            ',' if !in_string => {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                // Comma followed by a closer or by nothing at all
                if j >= chars.len() || chars[j] == ']' || chars[j] == '}' {
                    i += 1;
                    continue;
                }
                result.push(ch);
            }
            _ => result.push(ch),
        }
        i += 1;
    }

    result
}

/// Append the closers for every bracket and brace still open.
fn balance_brackets(s: &str) -> String {
    let mut result = s.trim_end().to_string();

    // A truncated `"key":` needs a placeholder before the closers
    if result.ends_with(':') {
        result.push_str("null");
    }

    let mut closers = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for ch in result.chars() {
        if escape {
            escape = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => closers.push('}'),
            '[' if !in_string => closers.push(']'),
            '}' | ']' if !in_string => {
                closers.pop();
            }
            _ => {}
        }
    }

    while let Some(closer) = closers.pop() {
        result.push(closer);
    }

    result
}

/// Extract the first complete JSON document embedded in surrounding prose.
fn extract_embedded(s: &str) -> Option<String> {
    let start = s.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, ch) in s[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(s[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_complete_document() {
        let value = parse_partial(r#"{"key": "value"}"#).unwrap();
        assert_eq!(value["key"], "value");
    }

    #[test]
    fn test_partial_empty_buffer() {
        assert!(parse_partial("").is_none());
        assert!(parse_partial("   ").is_none());
    }

    #[test]
    fn test_partial_unterminated_string() {
        let value = parse_partial(r#"{"normalized_topic": "Rust Owner"#).unwrap();
        assert_eq!(value["normalized_topic"], "Rust Owner");
    }

    #[test]
    fn test_partial_unclosed_array() {
        let buffer = r#"{"flashcards": [{"front": "q1", "back": "a1"}, {"front": "q2""#;
        let value = parse_partial(buffer).unwrap();
        let cards = value["flashcards"].as_array().unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0]["back"], "a1");
        assert_eq!(cards[1]["front"], "q2");
    }

    #[test]
    fn test_partial_dangling_comma() {
        let value = parse_partial(r#"{"flashcards": [{"front": "q", "back": "a"},"#).unwrap();
        assert_eq!(value["flashcards"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_partial_dangling_key() {
        let value = parse_partial(r#"{"normalized_topic": "X", "category":"#).unwrap();
        assert_eq!(value["normalized_topic"], "X");
        assert!(value["category"].is_null());
    }

    #[test]
    fn test_partial_mid_escape() {
        let value = parse_partial(r#"{"front": "say \"#).unwrap();
        assert!(value["front"].is_string());
    }

    #[test]
    fn test_partial_open_code_fence() {
        let value = parse_partial("```json\n{\"key\": \"val").unwrap();
        assert_eq!(value["key"], "val");
    }

    #[test]
    fn test_final_strict_accepts_complete() {
        let value = parse_final(r#"{"key": "value"}"#).unwrap();
        assert_eq!(value["key"], "value");
    }

    #[test]
    fn test_final_strips_fences() {
        let value = parse_final("```json\n{\"key\": \"value\"}\n```").unwrap();
        assert_eq!(value["key"], "value");
    }

    #[test]
    fn test_final_extracts_embedded() {
        let input = "Here are your flashcards:\n{\"flashcards\": []}\nEnjoy!";
        let value = parse_final(input).unwrap();
        assert!(value["flashcards"].is_array());
    }

    #[test]
    fn test_final_rejects_truncation() {
        let err = parse_final(r#"{"flashcards": [{"front": "q""#).unwrap_err();
        assert!(matches!(err, CardforgeError::MalformedOutput(_)));
    }

    #[test]
    fn test_final_rejects_garbage() {
        assert!(parse_final("no json here at all").is_err());
    }
}
