//! Relevance scoring between a business profile and a catalog item.

use std::collections::BTreeSet;

use crate::domain::catalog::CatalogItem;
use crate::domain::profile::BusinessProfile;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    /// Weight for the item's category appearing in the profile (default: 0.60)
    pub category_match: f64,
    /// Weight for profile terms found in the item text (default: 0.40)
    pub keyword_overlap: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    weights: ScoringWeights,
}

impl ScoreCalculator {
    pub fn new() -> Self {
        Self { weights: ScoringWeights::default() }
    }

    /// Weighted score in `[0.0, 1.0]`.
    pub fn score(&self, profile: &BusinessProfile, item: &CatalogItem) -> f64 {
        let total = self.category_score(profile, item) * self.weights.category_match
            + self.keyword_score(profile, item) * self.weights.keyword_overlap;

        total.clamp(0.0, 1.0)
    }

    pub fn category_score(&self, profile: &BusinessProfile, item: &CatalogItem) -> f64 {
        if profile.has_category(&item.category) {
            1.0
        } else {
            0.0
        }
    }

    /// Share of the profile's distinct terms that appear in the item text.
    pub fn keyword_score(&self, profile: &BusinessProfile, item: &CatalogItem) -> f64 {
        let terms = profile_terms(profile);
        if terms.is_empty() {
            return 0.0;
        }

        let haystack = item.searchable_text();
        let hits = terms.iter().filter(|term| haystack.contains(term.as_str())).count();
        hits as f64 / terms.len() as f64
    }
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}

// Words shorter than four characters ("the", "pos", "and") match too much
// free text to carry signal.
fn profile_terms(profile: &BusinessProfile) -> BTreeSet<String> {
    profile
        .keywords
        .iter()
        .chain(profile.challenges.iter())
        .chain(profile.goals.iter())
        .flat_map(|phrase| {
            phrase
                .split(|c: char| !c.is_alphanumeric())
                .map(str::to_lowercase)
                .filter(|word| word.chars().count() >= 4)
                .collect::<Vec<_>>()
        })
        .collect()
}
