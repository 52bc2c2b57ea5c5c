//! Candidate selection.
//!
//! Turns a curated, ordered id list into at most `limit` catalog items for one
//! request. Order is preserved unless reranking is switched on.

mod engine;
mod scoring;

pub use engine::{Selection, SelectionEngine};
pub use scoring::{ScoreCalculator, ScoringWeights};

pub const DEFAULT_WEIGHTS: ScoringWeights =
    ScoringWeights { category_match: 0.60, keyword_overlap: 0.40 };

/// Default number of items shown per response.
pub const DEFAULT_LIMIT: usize = 3;

/// Upper bound on `limit`; more cards than this overwhelm the chat layout.
pub const MAX_LIMIT: usize = 4;
