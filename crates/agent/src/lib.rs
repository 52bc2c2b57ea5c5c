//! Recommendation agent.
//!
//! Turns a conversation with a business owner into a short, explained list
//! of catalog modules:
//! 1. **Classify** (`classifier`): conversation → `BusinessProfile`.
//! 2. **Select** (`moduvisor_core::selection`): registry candidates, with
//!    exclusions and broadening.
//! 3. **Narrate** (`narrative`): one `[item:<id>]` line per selected item.
//! 4. **Guard** (`guardrails`): no marker may point outside the response.
//!
//! # Safety principle
//!
//! The model only describes. It never chooses ids; selection is deterministic
//! and every model failure has a local fallback.

pub mod classifier;
pub mod guardrails;
pub mod llm;
pub mod narrative;
pub mod parse;
pub mod prompts;
pub mod runtime;

pub use classifier::{BusinessClassifier, Classification};
pub use guardrails::{GuardedNarrative, GuardrailDecision, GuardrailPolicy};
pub use llm::{build_llm_client, CallPolicy, DisabledLlmClient, HttpLlmClient, LlmClient, LlmError};
pub use narrative::{Narrative, NarrativeGenerator};
pub use runtime::{PipelineSettings, RecommendationPipeline, EMPTY_RECOMMENDATION_TEXT};
