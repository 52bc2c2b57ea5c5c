//! Per-request recommendation pipeline.
//!
//! classify → resolve candidates → select (with broadening) → hydrate →
//! narrate → guard. Every stage degrades instead of failing, so callers only
//! ever see a [`RecommendationResult`].

use std::collections::BTreeSet;
use std::sync::Arc;

use moduvisor_core::catalog::{CatalogAccessor, CatalogSnapshot};
use moduvisor_core::config::AppConfig;
use moduvisor_core::domain::catalog::{CatalogItem, ItemId};
use moduvisor_core::domain::conversation::{Conversation, RecommendationRequest};
use moduvisor_core::domain::profile::BusinessProfile;
use moduvisor_core::domain::recommendation::{PipelineFallback, RecommendationResult};
use moduvisor_core::registry::PatternRegistry;
use moduvisor_core::selection::{Selection, SelectionEngine, DEFAULT_LIMIT};
use tracing::{info, warn};

use crate::classifier::BusinessClassifier;
use crate::guardrails::GuardrailPolicy;
use crate::llm::{CallPolicy, LlmClient};
use crate::narrative::NarrativeGenerator;

pub const EMPTY_RECOMMENDATION_TEXT: &str = "I couldn't find any new modules that fit what you described. \
Tell me a bit more about your business, or ask about something you haven't seen yet.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineSettings {
    pub limit: usize,
    pub rerank: bool,
    pub fallback_description_chars: usize,
    pub call_policy: CallPolicy,
    pub guardrails: GuardrailPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            rerank: false,
            fallback_description_chars: 180,
            call_policy: CallPolicy::default(),
            guardrails: GuardrailPolicy::default(),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            limit: config.recommendation.limit,
            rerank: config.recommendation.rerank,
            fallback_description_chars: config.recommendation.fallback_description_chars,
            call_policy: CallPolicy::from_config(&config.llm),
            guardrails: GuardrailPolicy::default(),
        }
    }
}

pub struct RecommendationPipeline {
    classifier: BusinessClassifier,
    narrator: NarrativeGenerator,
    catalog: Arc<dyn CatalogAccessor>,
    registry: Arc<PatternRegistry>,
    engine: SelectionEngine,
    settings: PipelineSettings,
}

impl RecommendationPipeline {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        catalog: Arc<dyn CatalogAccessor>,
        registry: Arc<PatternRegistry>,
        settings: PipelineSettings,
    ) -> Self {
        let classifier = BusinessClassifier::new(llm.clone(), settings.call_policy, registry.clone());
        let narrator =
            NarrativeGenerator::new(llm, settings.call_policy, settings.fallback_description_chars);
        let engine = SelectionEngine::new().with_rerank(settings.rerank);

        Self { classifier, narrator, catalog, registry, engine, settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn analyze(&self, conversation: &Conversation, correlation_id: &str) -> BusinessProfile {
        self.classifier.classify(conversation, correlation_id).await.profile
    }

    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
        correlation_id: &str,
    ) -> RecommendationResult {
        let mut fallbacks = Vec::new();

        let classification = self.classifier.classify(&request.conversation, correlation_id).await;
        if classification.fell_back {
            fallbacks.push(PipelineFallback::ClassifierDefault);
        }
        let profile = classification.profile;

        let snapshot = self.snapshot(correlation_id).await;
        let ids = self.select_ids(&profile, request, &snapshot, &mut fallbacks, correlation_id);

        let items = hydrate(&ids, &snapshot, correlation_id);
        if items.is_empty() {
            info!(
                event_name = "pipeline.recommend.completed",
                correlation_id,
                industry = profile.industry.as_str(),
                items = 0,
                "no recommendation available"
            );
            return RecommendationResult::new(
                EMPTY_RECOMMENDATION_TEXT.to_string(),
                Vec::new(),
                profile,
                fallbacks,
            );
        }

        let narrative =
            self.narrator.describe(&profile, &request.conversation, &items, correlation_id).await;
        if narrative.fell_back {
            fallbacks.push(PipelineFallback::NarrativeLocal);
        }

        let guarded = self.settings.guardrails.enforce(
            &narrative.text,
            &items,
            self.settings.fallback_description_chars,
            correlation_id,
        );

        let result = RecommendationResult::new(guarded.text, items, profile, fallbacks);
        info!(
            event_name = "pipeline.recommend.completed",
            correlation_id,
            industry = result.profile.industry.as_str(),
            items = result.items.len(),
            outcome = ?result.outcome,
            "recommendation assembled"
        );
        result
    }

    async fn snapshot(&self, correlation_id: &str) -> CatalogSnapshot {
        match self.catalog.list_all_items().await {
            Ok(items) => CatalogSnapshot::from_items(items),
            Err(error) => {
                warn!(
                    event_name = "pipeline.catalog.unavailable",
                    correlation_id,
                    error = %error,
                    "catalog unavailable, continuing with an empty snapshot"
                );
                CatalogSnapshot::default()
            }
        }
    }

    /// Curated row for the industry, then the generic row, then a
    /// category-restricted ranking of the whole catalog.
    fn select_ids(
        &self,
        profile: &BusinessProfile,
        request: &RecommendationRequest,
        snapshot: &CatalogSnapshot,
        fallbacks: &mut Vec<PipelineFallback>,
        correlation_id: &str,
    ) -> Vec<ItemId> {
        let limit = self.settings.limit;
        let excluded = &request.excluded_ids;
        let pattern = self.registry.lookup(profile.industry);

        let selection = self.select_curated(
            profile,
            &pattern.candidate_ids,
            excluded,
            snapshot,
            correlation_id,
        );
        if !selection.is_empty() {
            return selection.ids;
        }

        let generic = self.registry.generic();
        if pattern.industry != generic.industry {
            let selection = self.select_curated(
                profile,
                &generic.candidate_ids,
                excluded,
                snapshot,
                correlation_id,
            );
            if !selection.is_empty() {
                info!(
                    event_name = "pipeline.select.broadened",
                    correlation_id,
                    stage = "generic",
                    "curated candidates exhausted, using the generic row"
                );
                fallbacks.push(PipelineFallback::BroadenedToGeneric);
                return selection.ids;
            }
        }

        let mut categories = profile.relevant_categories.clone();
        categories.extend(pattern.categories.iter().cloned());
        let ranked = self.engine.rank_catalog(profile, &categories, excluded, snapshot, limit);
        if !ranked.is_empty() {
            info!(
                event_name = "pipeline.select.broadened",
                correlation_id,
                stage = "category",
                "curated rows exhausted, ranking the catalog by category"
            );
            fallbacks.push(PipelineFallback::BroadenedToCategory);
        }
        ranked
    }

    fn select_curated(
        &self,
        profile: &BusinessProfile,
        candidate_ids: &[ItemId],
        excluded: &BTreeSet<ItemId>,
        snapshot: &CatalogSnapshot,
        correlation_id: &str,
    ) -> Selection {
        let selection =
            self.engine.select(profile, candidate_ids, excluded, snapshot, self.settings.limit);
        for id in &selection.unknown_ids {
            warn!(
                event_name = "pipeline.select.unknown_id",
                correlation_id,
                item_id = id.0,
                "curated candidate is missing from the catalog"
            );
        }
        selection
    }
}

fn hydrate(ids: &[ItemId], snapshot: &CatalogSnapshot, correlation_id: &str) -> Vec<CatalogItem> {
    ids.iter()
        .filter_map(|id| match snapshot.get(*id) {
            Some(item) => Some(item.clone()),
            None => {
                warn!(
                    event_name = "pipeline.hydrate.unknown_id",
                    correlation_id,
                    item_id = id.0,
                    "selected id did not resolve to a catalog record"
                );
                None
            }
        })
        .collect()
}
