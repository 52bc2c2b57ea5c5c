//! Prompt templates for the classifier and the narrator.

use moduvisor_core::domain::catalog::CatalogItem;
use moduvisor_core::domain::profile::IndustryLabel;
use moduvisor_core::text::truncate_for_display;

/// Classifier instructions. `{industries}` and `{transcript}` are substituted.
pub const CLASSIFIER_PROMPT: &str = r#"You are a business analyst for a platform that sells software modules to small and medium businesses.

Read the conversation below and describe the user's business.

Respond with ONE JSON object and nothing else, using exactly these keys:
{
  "industry": one of [{industries}],
  "challenges": short phrases describing problems the user mentioned,
  "goals": short phrases describing what the user wants to achieve,
  "relevantCategories": module category tags that would help (e.g. "PAYMENTS", "BOOKING"),
  "keywords": notable nouns from the conversation
}

If the industry is unclear, use "general". Do not invent facts the user did not say.

=== CONVERSATION ===
{transcript}"#;

/// Narrator instructions. `{industry}`, `{transcript}` and `{items}` are substituted.
pub const NARRATIVE_PROMPT: &str = r#"You are a friendly product advisor. The user runs a {industry} business.

Explain briefly why each module below fits what the user described. Only talk about the modules listed; never mention other products.

Respond with ONE JSON object and nothing else:
{
  "intro": one warm sentence that acknowledges the user's situation,
  "items": [ { "id": module id as a number, "reason": one or two sentences } ]
}

=== CONVERSATION ===
{transcript}

=== MODULES ===
{items}"#;

const ITEM_DESCRIPTION_CHARS: usize = 240;

pub fn format_classifier_prompt(transcript: &str) -> String {
    let industries = IndustryLabel::ALL
        .iter()
        .map(|label| format!("\"{}\"", label.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    fill_template(CLASSIFIER_PROMPT, &[("industries", &industries), ("transcript", transcript)])
}

pub fn format_narrative_prompt(
    industry: IndustryLabel,
    transcript: &str,
    items: &[CatalogItem],
) -> String {
    let items = items.iter().map(format_item).collect::<Vec<_>>().join("\n");

    let industry = industry.as_str().replace('_', " ");
    fill_template(
        NARRATIVE_PROMPT,
        &[("industry", &industry), ("transcript", transcript), ("items", &items)],
    )
}

/// Single pass over `template`: substituted values are never scanned again,
/// so placeholders inside user or catalog text stay literal.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values.iter().find(|(name, _)| *name == key).map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                output.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                output.push('{');
                rest = after;
            }
        }
    }
    output.push_str(rest);
    output
}

fn format_item(item: &CatalogItem) -> String {
    let mut line = format!(
        "- id {}: {} [{}] {}",
        item.id,
        item.name,
        item.category,
        truncate_for_display(&item.description, ITEM_DESCRIPTION_CHARS)
    );
    if !item.key_features.is_empty() {
        line.push_str(" Features: ");
        line.push_str(&item.key_features.join("; "));
    }
    line
}

#[cfg(test)]
mod tests {
    use moduvisor_core::domain::catalog::{CatalogItem, ItemId};
    use moduvisor_core::domain::profile::IndustryLabel;

    use super::{fill_template, format_classifier_prompt, format_narrative_prompt};

    #[test]
    fn classifier_prompt_lists_vocabulary_and_transcript() {
        let prompt = format_classifier_prompt("User: I run a salon");

        assert!(prompt.contains("\"real_estate\""));
        assert!(prompt.contains("\"general\""));
        assert!(prompt.ends_with("User: I run a salon"));
        assert!(!prompt.contains("{transcript}"));
    }

    #[test]
    fn narrative_prompt_lists_only_given_items() {
        let items = vec![CatalogItem {
            id: ItemId(16),
            name: "QR Menu & Table Ordering".to_string(),
            description: "Guests order from their phones.".to_string(),
            category: "ORDERING".to_string(),
            key_features: vec!["QR menus".to_string(), "Split bills".to_string()],
            benefits: String::new(),
        }];

        let prompt =
            format_narrative_prompt(IndustryLabel::RealEstate, "User: hello", &items);

        assert!(prompt.contains("runs a real estate business"));
        assert!(prompt.contains("- id 16: QR Menu & Table Ordering [ORDERING]"));
        assert!(prompt.contains("Features: QR menus; Split bills"));
    }

    #[test]
    fn placeholders_inside_values_stay_literal() {
        let items = vec![CatalogItem {
            id: ItemId(9),
            name: "Template Builder".to_string(),
            description: "Merge fields like {transcript} into emails.".to_string(),
            category: "MARKETING".to_string(),
            key_features: Vec::new(),
            benefits: String::new(),
        }];

        let prompt = format_narrative_prompt(IndustryLabel::General, "User: {items} please", &items);

        assert!(prompt.contains("Merge fields like {transcript} into emails."));
        assert!(prompt.contains("User: {items} please"));
        assert_eq!(prompt.matches("User: {items} please").count(), 1);
    }

    #[test]
    fn json_braces_in_templates_are_kept() {
        let filled = fill_template("{\n  \"a\": {x}\n}", &[("x", "1")]);
        assert_eq!(filled, "{\n  \"a\": 1\n}");
    }
}
