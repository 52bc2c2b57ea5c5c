pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod markers;
pub mod registry;
pub mod selection;
pub mod text;

pub use catalog::{CatalogAccessor, CatalogError, CatalogSnapshot};
pub use domain::catalog::{CatalogItem, ItemId};
pub use domain::conversation::{Conversation, ConversationTurn, RecommendationRequest, Role};
pub use domain::profile::{BusinessProfile, IndustryLabel, DEFAULT_CATEGORIES};
pub use domain::recommendation::{PipelineFallback, RecommendationOutcome, RecommendationResult};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use markers::{extract_marker_ids, strip_unknown_markers};
pub use registry::{IndustryPattern, PatternRegistry, RegistryError};
pub use selection::{ScoreCalculator, ScoringWeights, Selection, SelectionEngine};
