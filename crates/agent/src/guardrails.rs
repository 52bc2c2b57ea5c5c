//! Output guard between the narrator and the caller.
//!
//! Presentation layers expand every `[item:<id>]` marker into an item card, so
//! a marker without a matching item in the response would render as a broken
//! card. The guard removes those and, when enabled, adds a line for selected
//! items the text never mentions.

use std::collections::BTreeSet;

use moduvisor_core::domain::catalog::{CatalogItem, ItemId};
use moduvisor_core::markers::{extract_marker_ids, find_markers, strip_unknown_markers};
use tracing::warn;

use crate::narrative::fallback_line;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Degrade { reason_code: &'static str, detail: String, fallback_path: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardrailPolicy {
    pub append_missing_items: bool,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self { append_missing_items: true }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuardedNarrative {
    pub text: String,
    pub removed_ids: Vec<ItemId>,
    pub appended_ids: Vec<ItemId>,
}

impl GuardrailPolicy {
    /// First violation found in `text`; unknown markers take precedence over
    /// missing ones.
    pub fn evaluate(&self, text: &str, items: &[CatalogItem]) -> GuardrailDecision {
        let unresolvable = find_markers(text).iter().filter(|span| span.id.is_none()).count();
        if unresolvable > 0 {
            return GuardrailDecision::Degrade {
                reason_code: "unresolvable_item_marker",
                detail: format!("{unresolvable} out-of-range ids"),
                fallback_path: "strip_unknown_markers",
            };
        }

        let allowed = allowed_ids(items);
        let referenced = extract_marker_ids(text);

        let unknown = referenced.iter().filter(|id| !allowed.contains(id)).collect::<Vec<_>>();
        if !unknown.is_empty() {
            return GuardrailDecision::Degrade {
                reason_code: "unknown_item_marker",
                detail: join_ids(unknown.into_iter().copied()),
                fallback_path: "strip_unknown_markers",
            };
        }

        if self.append_missing_items {
            let missing = missing_ids(&referenced, items);
            if !missing.is_empty() {
                return GuardrailDecision::Degrade {
                    reason_code: "missing_item_marker",
                    detail: join_ids(missing.into_iter()),
                    fallback_path: "append_fallback_line",
                };
            }
        }

        GuardrailDecision::Allow
    }

    pub fn enforce(
        &self,
        text: &str,
        items: &[CatalogItem],
        fallback_chars: usize,
        correlation_id: &str,
    ) -> GuardedNarrative {
        if self.evaluate(text, items) == GuardrailDecision::Allow {
            return GuardedNarrative { text: text.to_string(), ..GuardedNarrative::default() };
        }

        let (mut cleaned, removed_ids) = strip_unknown_markers(text, &allowed_ids(items));
        if !removed_ids.is_empty() {
            warn!(
                event_name = "pipeline.guard.unknown_marker",
                correlation_id,
                removed = %join_ids(removed_ids.iter().copied()),
                "removed markers for items outside the response"
            );
        }

        let mut appended_ids = Vec::new();
        if self.append_missing_items {
            let referenced = extract_marker_ids(&cleaned);
            for id in missing_ids(&referenced, items) {
                if let Some(item) = items.iter().find(|item| item.id == id) {
                    if !cleaned.is_empty() {
                        cleaned.push('\n');
                    }
                    cleaned.push_str(&fallback_line(item, fallback_chars));
                    appended_ids.push(id);
                }
            }
            if !appended_ids.is_empty() {
                warn!(
                    event_name = "pipeline.guard.missing_marker",
                    correlation_id,
                    appended = %join_ids(appended_ids.iter().copied()),
                    "appended lines for items the narrative skipped"
                );
            }
        }

        GuardedNarrative { text: cleaned, removed_ids, appended_ids }
    }
}

fn allowed_ids(items: &[CatalogItem]) -> BTreeSet<ItemId> {
    items.iter().map(|item| item.id).collect()
}

fn missing_ids(referenced: &[ItemId], items: &[CatalogItem]) -> Vec<ItemId> {
    items.iter().map(|item| item.id).filter(|id| !referenced.contains(id)).collect()
}

fn join_ids(ids: impl Iterator<Item = ItemId>) -> String {
    ids.map(|id| id.0.to_string()).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use moduvisor_core::domain::catalog::{CatalogItem, ItemId};
    use moduvisor_core::markers::extract_marker_ids;

    use super::{GuardrailDecision, GuardrailPolicy};

    fn item(id: i64, description: &str) -> CatalogItem {
        CatalogItem {
            id: ItemId(id),
            name: format!("Module {id}"),
            description: description.to_string(),
            category: "ORDERING".to_string(),
            key_features: Vec::new(),
            benefits: String::new(),
        }
    }

    #[test]
    fn consistent_text_is_allowed_untouched() {
        let policy = GuardrailPolicy::default();
        let items = vec![item(16, "QR ordering"), item(3, "QRIS")];
        let text = "Intro\n[item:16] Order at the table.\n[item:3] Pay by QR.";

        assert_eq!(policy.evaluate(text, &items), GuardrailDecision::Allow);
        let guarded = policy.enforce(text, &items, 180, "req-1");
        assert_eq!(guarded.text, text);
        assert!(guarded.removed_ids.is_empty());
        assert!(guarded.appended_ids.is_empty());
    }

    #[test]
    fn dangling_markers_are_degraded_and_stripped() {
        let policy = GuardrailPolicy::default();
        let items = vec![item(16, "QR ordering")];
        let text = "[item:16] Order at the table.\n[item:404] Ghost module.";

        let decision = policy.evaluate(text, &items);
        let (reason_code, detail, fallback_path) = match decision {
            GuardrailDecision::Degrade { reason_code, detail, fallback_path } => {
                (reason_code, detail, fallback_path)
            }
            GuardrailDecision::Allow => ("", String::new(), ""),
        };
        assert_eq!(reason_code, "unknown_item_marker");
        assert_eq!(detail, "404");
        assert_eq!(fallback_path, "strip_unknown_markers");

        let guarded = policy.enforce(text, &items, 180, "req-2");
        assert_eq!(guarded.removed_ids, vec![ItemId(404)]);
        assert_eq!(extract_marker_ids(&guarded.text), vec![ItemId(16)]);
    }

    #[test]
    fn skipped_items_get_appended_when_enabled() {
        let items = vec![item(16, "QR ordering"), item(3, "QRIS payments")];
        let text = "[item:16] Order at the table.";

        let guarded = GuardrailPolicy::default().enforce(text, &items, 180, "req-3");
        assert_eq!(guarded.appended_ids, vec![ItemId(3)]);
        assert_eq!(guarded.text, "[item:16] Order at the table.\n[item:3] QRIS payments");

        let strict = GuardrailPolicy { append_missing_items: false };
        assert_eq!(strict.evaluate(text, &items), GuardrailDecision::Allow);
        assert_eq!(strict.enforce(text, &items, 180, "req-3").text, text);
    }

    #[test]
    fn out_of_range_markers_are_stripped() {
        let policy = GuardrailPolicy::default();
        let items = vec![item(3, "QRIS")];
        let text = "[item:3] Pair it with [item:99999999999999999999] later.";

        assert!(matches!(
            policy.evaluate(text, &items),
            GuardrailDecision::Degrade { reason_code: "unresolvable_item_marker", .. }
        ));
        let guarded = policy.enforce(text, &items, 180, "req-4");
        assert_eq!(guarded.text, "[item:3] Pair it with later.");
        assert!(guarded.removed_ids.is_empty());
    }
}
