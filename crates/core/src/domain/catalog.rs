use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::text::{normalize_whitespace, strip_markup};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recommendable business module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default, deserialize_with = "deserialize_key_features")]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub benefits: String,
}

impl CatalogItem {
    /// Benefit text with emphasis and truncation markup removed.
    pub fn plain_benefits(&self) -> String {
        strip_markup(&self.benefits)
    }

    /// Lowercased concatenation of every text field, used for keyword matching.
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(
            self.name.len() + self.description.len() + self.benefits.len() + 64,
        );
        text.push_str(&self.name);
        text.push(' ');
        text.push_str(&self.description);
        text.push(' ');
        text.push_str(&self.key_features.join(" "));
        text.push(' ');
        text.push_str(&self.plain_benefits());
        text.to_lowercase()
    }
}

/// Canonical form of a category tag: trimmed, uppercase, words joined by `-`.
pub fn normalize_category(tag: &str) -> String {
    tag.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Splits a delimited feature string into an ordered list.
///
/// Newlines, `;` and `|` are treated as separators first. A single remaining
/// fragment is then split on commas. Leading bullet characters are dropped.
pub fn normalize_key_features(raw: &str) -> Vec<String> {
    let primary = split_features(raw, &['\n', ';', '|']);
    let fragments = if primary.len() <= 1 { split_features(raw, &[',']) } else { primary };

    fragments
        .into_iter()
        .map(|fragment| {
            fragment.trim_start_matches(|c: char| matches!(c, '-' | '*' | '•') || c.is_whitespace())
        })
        .map(normalize_whitespace)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

fn split_features<'a>(raw: &'a str, separators: &[char]) -> Vec<&'a str> {
    raw.split(|c: char| separators.contains(&c))
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeyFeaturesInput {
    List(Vec<String>),
    Delimited(String),
}

fn deserialize_key_features<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<KeyFeaturesInput>::deserialize(deserializer)?;
    Ok(match input {
        None => Vec::new(),
        Some(KeyFeaturesInput::List(values)) => values
            .iter()
            .map(|value| normalize_whitespace(value))
            .filter(|value| !value.is_empty())
            .collect(),
        Some(KeyFeaturesInput::Delimited(raw)) => normalize_key_features(&raw),
    })
}
