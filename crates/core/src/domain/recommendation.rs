use serde::Serialize;

use crate::domain::catalog::{CatalogItem, ItemId};
use crate::domain::profile::BusinessProfile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationOutcome {
    Recommended,
    Empty,
    /// Items were returned but the classifier or narrator used its local fallback.
    Degraded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineFallback {
    ClassifierDefault,
    NarrativeLocal,
    BroadenedToGeneric,
    BroadenedToCategory,
}

impl PipelineFallback {
    pub fn degrades_quality(&self) -> bool {
        matches!(self, Self::ClassifierDefault | Self::NarrativeLocal)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecommendationResult {
    pub narrative: String,
    pub items: Vec<CatalogItem>,
    pub profile: BusinessProfile,
    pub outcome: RecommendationOutcome,
    pub fallbacks: Vec<PipelineFallback>,
}

impl RecommendationResult {
    pub fn new(
        narrative: String,
        items: Vec<CatalogItem>,
        profile: BusinessProfile,
        fallbacks: Vec<PipelineFallback>,
    ) -> Self {
        let outcome = if items.is_empty() {
            RecommendationOutcome::Empty
        } else if fallbacks.iter().any(PipelineFallback::degrades_quality) {
            RecommendationOutcome::Degraded
        } else {
            RecommendationOutcome::Recommended
        };

        Self { narrative, items, profile, outcome, fallbacks }
    }

    pub fn selected_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }
}
