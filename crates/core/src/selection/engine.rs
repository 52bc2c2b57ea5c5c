//! Selection engine implementation

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use super::scoring::ScoreCalculator;
use crate::catalog::CatalogSnapshot;
use crate::domain::catalog::ItemId;
use crate::domain::profile::BusinessProfile;

/// Ids chosen for one request plus curated candidates missing from the
/// catalog, which the caller reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub ids: Vec<ItemId>,
    pub unknown_ids: Vec<ItemId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionEngine {
    calculator: ScoreCalculator,
    rerank: bool,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reorders surviving candidates by relevance score when there are more
    /// of them than `limit`. Curated order is used otherwise.
    pub fn with_rerank(mut self, rerank: bool) -> Self {
        self.rerank = rerank;
        self
    }

    /// Picks at most `limit` ids from `candidate_ids`.
    ///
    /// Excluded ids, repeats and ids missing from the catalog are skipped.
    pub fn select(
        &self,
        profile: &BusinessProfile,
        candidate_ids: &[ItemId],
        excluded: &BTreeSet<ItemId>,
        catalog: &CatalogSnapshot,
        limit: usize,
    ) -> Selection {
        let mut seen = HashSet::with_capacity(candidate_ids.len());
        let mut ids = Vec::with_capacity(candidate_ids.len());
        let mut unknown_ids = Vec::new();

        for id in candidate_ids.iter().copied() {
            if excluded.contains(&id) || !seen.insert(id) {
                continue;
            }
            if !catalog.contains(id) {
                unknown_ids.push(id);
                continue;
            }
            ids.push(id);
        }

        if self.rerank && ids.len() > limit {
            self.sort_by_score(profile, catalog, &mut ids);
        }
        ids.truncate(limit);

        Selection { ids, unknown_ids }
    }

    /// Scores the whole catalog against `profile`, keeping only items in one
    /// of `categories`. Used when curated candidates are exhausted.
    pub fn rank_catalog(
        &self,
        profile: &BusinessProfile,
        categories: &[String],
        excluded: &BTreeSet<ItemId>,
        catalog: &CatalogSnapshot,
        limit: usize,
    ) -> Vec<ItemId> {
        let mut scoring_profile = profile.clone();
        scoring_profile.relevant_categories.extend(categories.iter().cloned());
        let scoring_profile = scoring_profile.normalized();

        let mut scored = catalog
            .items()
            .iter()
            .filter(|item| !excluded.contains(&item.id))
            .filter(|item| scoring_profile.has_category(&item.category))
            .map(|item| (item.id, self.calculator.score(&scoring_profile, item)))
            .filter(|(_, score)| *score > 0.0)
            .collect::<Vec<_>>();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.into_iter().take(limit).map(|(id, _)| id).collect()
    }

    fn sort_by_score(&self, profile: &BusinessProfile, catalog: &CatalogSnapshot, ids: &mut [ItemId]) {
        let score_of = |id: ItemId| {
            catalog.get(id).map(|item| self.calculator.score(profile, item)).unwrap_or(0.0)
        };

        ids.sort_by(|a, b| match score_of(*b).total_cmp(&score_of(*a)) {
            Ordering::Equal => a.cmp(b),
            ordering => ordering,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::catalog::CatalogItem;
    use crate::domain::profile::IndustryLabel;

    fn item(id: i64, category: &str, description: &str) -> CatalogItem {
        CatalogItem {
            id: ItemId(id),
            name: format!("Module {id}"),
            description: description.to_string(),
            category: category.to_string(),
            key_features: Vec::new(),
            benefits: String::new(),
        }
    }

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::from_items(vec![
            item(3, "PAYMENTS", "Accept QRIS payments at the counter"),
            item(6, "BOOKING", "Online table reservations"),
            item(14, "LOYALTY", "Reward repeat guests"),
            item(16, "ORDERING", "QR menu and table ordering"),
            item(17, "ORDERING", "Kitchen display for busy nights"),
        ])
    }

    fn profile(categories: &[&str], keywords: &[&str]) -> BusinessProfile {
        BusinessProfile {
            industry: IndustryLabel::Restaurant,
            challenges: Vec::new(),
            goals: Vec::new(),
            relevant_categories: categories.iter().map(ToString::to_string).collect(),
            keywords: keywords.iter().map(ToString::to_string).collect(),
        }
    }

    fn ids(raw: &[i64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId).collect()
    }

    #[test]
    fn test_select_keeps_curated_order_and_limit() {
        let engine = SelectionEngine::new();
        let selection = engine.select(
            &BusinessProfile::default(),
            &ids(&[16, 3, 6, 17, 14]),
            &BTreeSet::new(),
            &catalog(),
            3,
        );

        assert_eq!(selection.ids, ids(&[16, 3, 6]));
        assert!(selection.unknown_ids.is_empty());
    }

    #[test]
    fn test_select_skips_excluded_duplicates_and_unknown() {
        let engine = SelectionEngine::new();
        let excluded = BTreeSet::from([ItemId(16), ItemId(3)]);
        let selection = engine.select(
            &BusinessProfile::default(),
            &ids(&[16, 3, 999, 6, 6, 17, 14]),
            &excluded,
            &catalog(),
            3,
        );

        assert_eq!(selection.ids, ids(&[6, 17, 14]));
        assert_eq!(selection.unknown_ids, ids(&[999]));
    }

    #[test]
    fn test_select_with_no_candidates_is_empty() {
        let engine = SelectionEngine::new();
        let selection =
            engine.select(&BusinessProfile::default(), &[], &BTreeSet::new(), &catalog(), 3);

        assert!(selection.is_empty());
    }

    #[test]
    fn test_rerank_orders_by_score_then_id() {
        let engine = SelectionEngine::new().with_rerank(true);
        let selection = engine.select(
            &profile(&["ORDERING"], &["kitchen"]),
            &ids(&[3, 6, 16, 17]),
            &BTreeSet::new(),
            &catalog(),
            2,
        );

        // 17 matches category and keyword, 16 only the category.
        assert_eq!(selection.ids, ids(&[17, 16]));
    }

    #[test]
    fn test_rerank_is_skipped_when_candidates_fit() {
        let engine = SelectionEngine::new().with_rerank(true);
        let selection = engine.select(
            &profile(&["ORDERING"], &["kitchen"]),
            &ids(&[3, 17]),
            &BTreeSet::new(),
            &catalog(),
            3,
        );

        assert_eq!(selection.ids, ids(&[3, 17]));
    }

    #[test]
    fn test_rank_catalog_filters_categories_and_exclusions() {
        let engine = SelectionEngine::new();
        let ranked = engine.rank_catalog(
            &profile(&["LOYALTY"], &["reservations"]),
            &["booking".to_string()],
            &BTreeSet::from([ItemId(14)]),
            &catalog(),
            3,
        );

        assert_eq!(ranked, ids(&[6]));
    }
}
