use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::catalog::normalize_category;

/// Broadly applicable category tags used whenever nothing better is known.
pub const DEFAULT_CATEGORIES: [&str; 3] = ["CRM", "PAYMENTS", "MARKETING"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryLabel {
    Restaurant,
    Travel,
    Retail,
    Hotel,
    Fitness,
    Beauty,
    Medical,
    Education,
    Auto,
    RealEstate,
    Logistics,
    Legal,
    Consulting,
    Event,
    Delivery,
    General,
}

/// Free-form labels the classifier may return, mapped onto the closed vocabulary.
/// Earlier rows win when a label mentions several industries.
const INDUSTRY_SYNONYMS: &[(&str, IndustryLabel)] = &[
    ("restaurant", IndustryLabel::Restaurant),
    ("cafe", IndustryLabel::Restaurant),
    ("coffee", IndustryLabel::Restaurant),
    ("food", IndustryLabel::Restaurant),
    ("pizza", IndustryLabel::Restaurant),
    ("bar", IndustryLabel::Restaurant),
    ("bakery", IndustryLabel::Restaurant),
    ("catering", IndustryLabel::Restaurant),
    ("hotel", IndustryLabel::Hotel),
    ("hospitality", IndustryLabel::Hotel),
    ("villa", IndustryLabel::Hotel),
    ("guesthouse", IndustryLabel::Hotel),
    ("hostel", IndustryLabel::Hotel),
    ("resort", IndustryLabel::Hotel),
    ("travel", IndustryLabel::Travel),
    ("tour", IndustryLabel::Travel),
    ("tourism", IndustryLabel::Travel),
    ("retail", IndustryLabel::Retail),
    ("shop", IndustryLabel::Retail),
    ("store", IndustryLabel::Retail),
    ("boutique", IndustryLabel::Retail),
    ("ecommerce", IndustryLabel::Retail),
    ("fitness", IndustryLabel::Fitness),
    ("gym", IndustryLabel::Fitness),
    ("yoga", IndustryLabel::Fitness),
    ("studio", IndustryLabel::Fitness),
    ("beauty", IndustryLabel::Beauty),
    ("salon", IndustryLabel::Beauty),
    ("spa", IndustryLabel::Beauty),
    ("barber", IndustryLabel::Beauty),
    ("medical", IndustryLabel::Medical),
    ("clinic", IndustryLabel::Medical),
    ("dental", IndustryLabel::Medical),
    ("health", IndustryLabel::Medical),
    ("healthcare", IndustryLabel::Medical),
    ("education", IndustryLabel::Education),
    ("school", IndustryLabel::Education),
    ("tutoring", IndustryLabel::Education),
    ("academy", IndustryLabel::Education),
    ("auto", IndustryLabel::Auto),
    ("automotive", IndustryLabel::Auto),
    ("car", IndustryLabel::Auto),
    ("garage", IndustryLabel::Auto),
    ("workshop", IndustryLabel::Auto),
    ("real_estate", IndustryLabel::RealEstate),
    ("realestate", IndustryLabel::RealEstate),
    ("property", IndustryLabel::RealEstate),
    ("realtor", IndustryLabel::RealEstate),
    ("logistics", IndustryLabel::Logistics),
    ("freight", IndustryLabel::Logistics),
    ("warehouse", IndustryLabel::Logistics),
    ("shipping", IndustryLabel::Logistics),
    ("legal", IndustryLabel::Legal),
    ("law", IndustryLabel::Legal),
    ("lawyer", IndustryLabel::Legal),
    ("notary", IndustryLabel::Legal),
    ("consulting", IndustryLabel::Consulting),
    ("consultancy", IndustryLabel::Consulting),
    ("event", IndustryLabel::Event),
    ("events", IndustryLabel::Event),
    ("wedding", IndustryLabel::Event),
    ("concert", IndustryLabel::Event),
    ("delivery", IndustryLabel::Delivery),
    ("courier", IndustryLabel::Delivery),
    ("general", IndustryLabel::General),
    ("other", IndustryLabel::General),
];

impl IndustryLabel {
    pub const ALL: [IndustryLabel; 16] = [
        Self::Restaurant,
        Self::Travel,
        Self::Retail,
        Self::Hotel,
        Self::Fitness,
        Self::Beauty,
        Self::Medical,
        Self::Education,
        Self::Auto,
        Self::RealEstate,
        Self::Logistics,
        Self::Legal,
        Self::Consulting,
        Self::Event,
        Self::Delivery,
        Self::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Travel => "travel",
            Self::Retail => "retail",
            Self::Hotel => "hotel",
            Self::Fitness => "fitness",
            Self::Beauty => "beauty",
            Self::Medical => "medical",
            Self::Education => "education",
            Self::Auto => "auto",
            Self::RealEstate => "real_estate",
            Self::Logistics => "logistics",
            Self::Legal => "legal",
            Self::Consulting => "consulting",
            Self::Event => "event",
            Self::Delivery => "delivery",
            Self::General => "general",
        }
    }

    /// Strict slug lookup (`"real_estate"`), used for configuration data.
    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|label| label.as_str() == slug)
    }

    /// Lenient mapping of a model-produced label onto the closed vocabulary.
    /// Anything unrecognized becomes [`IndustryLabel::General`].
    pub fn normalize(raw: &str) -> Self {
        let normalized = raw
            .trim()
            .to_ascii_lowercase()
            .replace(['-', '/', '&', ','], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");

        if let Some(label) = Self::from_slug(&normalized) {
            return label;
        }
        if let Some((_, label)) = INDUSTRY_SYNONYMS.iter().find(|(alias, _)| *alias == normalized)
        {
            return *label;
        }

        let tokens = normalized.split('_').collect::<Vec<_>>();
        INDUSTRY_SYNONYMS
            .iter()
            .find(|(alias, _)| tokens.contains(alias))
            .map(|(_, label)| *label)
            .unwrap_or(Self::General)
    }

    pub fn is_general(&self) -> bool {
        matches!(self, Self::General)
    }
}

impl fmt::Display for IndustryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured view of the end user's business derived from one conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    pub industry: IndustryLabel,
    pub challenges: Vec<String>,
    pub goals: Vec<String>,
    pub relevant_categories: Vec<String>,
    pub keywords: Vec<String>,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        Self {
            industry: IndustryLabel::General,
            challenges: Vec::new(),
            goals: Vec::new(),
            relevant_categories: DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect(),
            keywords: Vec::new(),
        }
    }
}

impl BusinessProfile {
    /// Canonicalizes category tags and removes blank or repeated entries from every list.
    pub fn normalized(mut self) -> Self {
        self.challenges = dedupe_phrases(self.challenges);
        self.goals = dedupe_phrases(self.goals);
        self.keywords = dedupe_phrases(self.keywords);

        let mut categories: Vec<String> = Vec::with_capacity(self.relevant_categories.len());
        for tag in self.relevant_categories.iter().map(|tag| normalize_category(tag)) {
            if !tag.is_empty() && !categories.contains(&tag) {
                categories.push(tag);
            }
        }
        self.relevant_categories = categories;
        self
    }

    pub fn has_category(&self, category: &str) -> bool {
        let wanted = normalize_category(category);
        self.relevant_categories.iter().any(|tag| normalize_category(tag) == wanted)
    }
}

fn dedupe_phrases(values: Vec<String>) -> Vec<String> {
    let mut seen = Vec::<String>::with_capacity(values.len());
    let mut kept = Vec::with_capacity(values.len());
    for value in values {
        let trimmed = value.split_whitespace().collect::<Vec<_>>().join(" ");
        let key = trimmed.to_lowercase();
        if trimmed.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        kept.push(trimmed);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::{BusinessProfile, IndustryLabel};

    #[test]
    fn normalize_maps_synonyms_and_phrases() {
        assert_eq!(IndustryLabel::normalize("Restaurant"), IndustryLabel::Restaurant);
        assert_eq!(IndustryLabel::normalize("real estate"), IndustryLabel::RealEstate);
        assert_eq!(IndustryLabel::normalize("Hair Salon"), IndustryLabel::Beauty);
        assert_eq!(IndustryLabel::normalize("pizza delivery"), IndustryLabel::Restaurant);
        assert_eq!(IndustryLabel::normalize("courier"), IndustryLabel::Delivery);
        assert_eq!(IndustryLabel::normalize("quantum widgets"), IndustryLabel::General);
        assert_eq!(IndustryLabel::normalize(""), IndustryLabel::General);
    }

    #[test]
    fn slug_lookup_is_strict() {
        assert_eq!(IndustryLabel::from_slug("real_estate"), Some(IndustryLabel::RealEstate));
        assert_eq!(IndustryLabel::from_slug("salon"), None);
    }

    #[test]
    fn default_profile_has_every_field() {
        let profile = BusinessProfile::default();
        let json = serde_json::to_value(&profile).expect("serialize");

        assert_eq!(json["industry"], "general");
        for key in ["challenges", "goals", "relevantCategories", "keywords"] {
            assert!(json[key].is_array(), "{key} should always be present");
        }
        assert_eq!(profile.relevant_categories, vec!["CRM", "PAYMENTS", "MARKETING"]);
    }

    #[test]
    fn normalized_dedupes_and_canonicalizes() {
        let profile = BusinessProfile {
            industry: IndustryLabel::Retail,
            challenges: vec!["Slow checkout".into(), "slow  checkout".into(), " ".into()],
            goals: vec![],
            relevant_categories: vec!["e commerce".into(), "E-COMMERCE".into(), "crm".into()],
            keywords: vec!["batik".into()],
        }
        .normalized();

        assert_eq!(profile.challenges, vec!["Slow checkout"]);
        assert_eq!(profile.relevant_categories, vec!["E-COMMERCE", "CRM"]);
        assert!(profile.has_category("crm"));
    }
}
