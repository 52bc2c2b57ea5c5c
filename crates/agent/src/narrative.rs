//! Explanatory text for selected items, with `[item:<id>]` markers.
//!
//! The model only supplies an intro and one reason per id; the marker layout
//! is assembled here, so the output can never reference an id that was not
//! passed in.

use std::collections::HashMap;
use std::sync::Arc;

use moduvisor_core::domain::catalog::{CatalogItem, ItemId};
use moduvisor_core::domain::conversation::Conversation;
use moduvisor_core::domain::profile::BusinessProfile;
use moduvisor_core::markers::{marker, strip_all_markers};
use moduvisor_core::text::{normalize_whitespace, truncate_for_display};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::llm::{CallPolicy, LlmClient};
use crate::parse::{clean_generated_text, parse_structured, ParseError};
use crate::prompts::format_narrative_prompt;

pub const FALLBACK_INTRO: &str = "Here are a few modules that fit what you described:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Narrative {
    pub text: String,
    /// True when no model-written reason was used.
    pub fell_back: bool,
}

pub struct NarrativeGenerator {
    llm: Arc<dyn LlmClient>,
    policy: CallPolicy,
    max_chars: usize,
}

impl NarrativeGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, policy: CallPolicy, max_chars: usize) -> Self {
        Self { llm, policy, max_chars }
    }

    pub async fn describe(
        &self,
        profile: &BusinessProfile,
        conversation: &Conversation,
        items: &[CatalogItem],
        correlation_id: &str,
    ) -> Narrative {
        if items.is_empty() {
            return Narrative { text: String::new(), fell_back: false };
        }

        let prompt = format_narrative_prompt(profile.industry, &conversation.transcript(), items);
        let raw = match self.policy.complete(self.llm.as_ref(), &prompt, "narrate", correlation_id).await
        {
            Ok(raw) => raw,
            Err(error) => {
                warn!(
                    event_name = "pipeline.narrate.fallback",
                    correlation_id,
                    reason = "llm_error",
                    error = %error,
                    "narrative fell back to catalog descriptions"
                );
                return self.fallback(items);
            }
        };

        match self.assemble(&raw, items) {
            Ok((text, model_reasons)) => {
                info!(
                    event_name = "pipeline.narrate.completed",
                    correlation_id,
                    items = items.len(),
                    model_reasons,
                    "narrative generated"
                );
                Narrative { text, fell_back: false }
            }
            Err(error) => {
                warn!(
                    event_name = "pipeline.narrate.fallback",
                    correlation_id,
                    reason = "malformed_output",
                    error = %error,
                    "narrative fell back to catalog descriptions"
                );
                self.fallback(items)
            }
        }
    }

    pub fn fallback(&self, items: &[CatalogItem]) -> Narrative {
        Narrative { text: fallback_narrative(items, self.max_chars), fell_back: true }
    }

    /// Builds the text from model output. Returns the number of items that got
    /// a model-written reason; zero counts as a parse failure.
    fn assemble(&self, raw: &str, items: &[CatalogItem]) -> Result<(String, usize), ParseError> {
        let parsed: RawNarrative = parse_structured(raw)?;

        let mut reasons: HashMap<ItemId, String> = HashMap::new();
        for entry in parsed.items {
            let Some(id) = parse_reason_id(&entry.id) else {
                continue;
            };
            if !items.iter().any(|item| item.id == id) || reasons.contains_key(&id) {
                continue;
            }
            let reason = clean_generated_text(&entry.reason, self.max_chars);
            if !reason.is_empty() {
                reasons.insert(id, reason);
            }
        }

        if reasons.is_empty() {
            return Err(ParseError::Shape("no usable item reasons".to_string()));
        }

        let mut lines = Vec::with_capacity(items.len() + 1);
        let intro = clean_generated_text(&parsed.intro, self.max_chars);
        if !intro.is_empty() {
            lines.push(intro);
        }
        for item in items {
            match reasons.get(&item.id) {
                Some(reason) => lines.push(format!("{} {reason}", marker(item.id))),
                None => lines.push(fallback_line(item, self.max_chars)),
            }
        }

        Ok((lines.join("\n"), reasons.len()))
    }
}

/// `"[item:<id>] <text>"` built from the catalog record alone.
pub fn fallback_line(item: &CatalogItem, max_chars: usize) -> String {
    let source = [item.description.clone(), item.plain_benefits(), item.name.clone()]
        .into_iter()
        .map(|text| normalize_whitespace(&strip_all_markers(&text)))
        .find(|text| !text.is_empty())
        .unwrap_or_default();

    format!("{} {}", marker(item.id), truncate_for_display(&source, max_chars))
}

pub fn fallback_narrative(items: &[CatalogItem], max_chars: usize) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(FALLBACK_INTRO.to_string());
    lines.extend(items.iter().map(|item| fallback_line(item, max_chars)));
    lines.join("\n")
}

#[derive(Debug, Deserialize)]
struct RawNarrative {
    #[serde(default)]
    intro: String,
    #[serde(default)]
    items: Vec<RawReason>,
}

#[derive(Debug, Deserialize)]
struct RawReason {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    reason: String,
}

// Accepts 16, "16", "item:16" and "[item:16]".
fn parse_reason_id(value: &Value) -> Option<ItemId> {
    match value {
        Value::Number(number) => number.as_i64().map(ItemId),
        Value::String(text) => {
            let trimmed = text.trim().trim_start_matches('[').trim_end_matches(']');
            let digits = trimmed.strip_prefix("item:").unwrap_or(trimmed).trim();
            digits.parse::<i64>().ok().map(ItemId)
        }
        _ => None,
    }
}
