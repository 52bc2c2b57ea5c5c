//! Parse-or-default adapter for model output.
//!
//! Models wrap JSON in code fences, add prose around it, and sprinkle
//! markdown into free text. Everything that cleans model output lives here.

use moduvisor_core::markers::strip_all_markers;
use moduvisor_core::text::{normalize_whitespace, strip_markup, truncate_for_display};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("response contained no JSON object")]
    MissingObject,
    #[error("response JSON did not match the expected shape: {0}")]
    Shape(String),
}

/// Removes a surrounding ```` ``` ```` / ```` ```json ```` fence if present.
/// Only the fence tokens go; a one-line reply keeps its body.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    let tag_len =
        after_open.find(|c: char| !c.is_ascii_alphanumeric()).unwrap_or(after_open.len());
    let mut body = &after_open[tag_len..];
    while let Some(inner) = body.trim_end().strip_suffix("```") {
        body = inner;
    }

    body.trim().to_string()
}

/// Outermost `{ ... }` span of `raw`.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

pub fn parse_structured<T>(raw: &str) -> Result<T, ParseError>
where
    T: DeserializeOwned,
{
    let unfenced = strip_code_fences(raw);
    let object = extract_json_object(&unfenced)
        .or_else(|| extract_json_object(raw))
        .ok_or(ParseError::MissingObject)?;
    serde_json::from_str(object).map_err(|error| ParseError::Shape(error.to_string()))
}

/// Free text from the model made safe to show: markers and emphasis removed,
/// whitespace collapsed, cut to `max_chars`.
pub fn clean_generated_text(raw: &str, max_chars: usize) -> String {
    let without_markers = strip_all_markers(raw);
    let plain = strip_markup(&without_markers);
    truncate_for_display(&normalize_whitespace(&plain), max_chars)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::{clean_generated_text, extract_json_object, parse_structured, strip_code_fences, ParseError};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        industry: String,
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json {\"a\":1} ```"), "{\"a\":1}");
    }

    #[test]
    fn single_line_fenced_reply_parses() {
        let parsed: Sample =
            parse_structured("```json {\"industry\": \"hotel\"} ```").expect("parses");
        assert_eq!(parsed, Sample { industry: "hotel".to_string() });
    }

    #[test]
    fn object_is_found_inside_prose() {
        let raw = "Sure! Here you go: {\"industry\": \"hotel\"} Hope that helps.";
        assert_eq!(extract_json_object(raw), Some("{\"industry\": \"hotel\"}"));
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn parse_structured_handles_fences_and_prose() {
        let parsed: Sample =
            parse_structured("```json\nResult:\n{\"industry\":\"retail\"}\n```").expect("parses");
        assert_eq!(parsed, Sample { industry: "retail".to_string() });
    }

    #[test]
    fn parse_structured_reports_failures() {
        assert_eq!(parse_structured::<Sample>("I cannot help"), Err(ParseError::MissingObject));
        assert!(matches!(
            parse_structured::<Sample>("{\"industry\": 7}"),
            Err(ParseError::Shape(_))
        ));
    }

    #[test]
    fn generated_text_is_cleaned() {
        let cleaned = clean_generated_text("**Fast** checkout with [item:3]   QRIS...", 200);
        assert_eq!(cleaned, "Fast checkout with QRIS");
    }
}
