//! Conversation → [`BusinessProfile`].
//!
//! Never fails: any model or parse problem yields the default profile.

use std::sync::Arc;

use moduvisor_core::domain::conversation::Conversation;
use moduvisor_core::domain::profile::{BusinessProfile, IndustryLabel};
use moduvisor_core::registry::PatternRegistry;
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use crate::llm::{CallPolicy, LlmClient};
use crate::parse::{parse_structured, ParseError};
use crate::prompts::format_classifier_prompt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub profile: BusinessProfile,
    /// True when the default profile was substituted.
    pub fell_back: bool,
}

pub struct BusinessClassifier {
    llm: Arc<dyn LlmClient>,
    policy: CallPolicy,
    registry: Arc<PatternRegistry>,
}

impl BusinessClassifier {
    pub fn new(llm: Arc<dyn LlmClient>, policy: CallPolicy, registry: Arc<PatternRegistry>) -> Self {
        Self { llm, policy, registry }
    }

    pub async fn classify(&self, conversation: &Conversation, correlation_id: &str) -> Classification {
        let prompt = format_classifier_prompt(&conversation.transcript());

        let raw = match self.policy.complete(self.llm.as_ref(), &prompt, "classify", correlation_id).await
        {
            Ok(raw) => raw,
            Err(error) => {
                warn!(
                    event_name = "pipeline.classify.fallback",
                    correlation_id,
                    reason = "llm_error",
                    error = %error,
                    "classifier fell back to the default profile"
                );
                return Self::fallback();
            }
        };

        match self.profile_from_output(&raw) {
            Ok(profile) => {
                info!(
                    event_name = "pipeline.classify.completed",
                    correlation_id,
                    industry = profile.industry.as_str(),
                    categories = profile.relevant_categories.len(),
                    "conversation classified"
                );
                Classification { profile, fell_back: false }
            }
            Err(error) => {
                warn!(
                    event_name = "pipeline.classify.fallback",
                    correlation_id,
                    reason = "malformed_output",
                    error = %error,
                    "classifier fell back to the default profile"
                );
                Self::fallback()
            }
        }
    }

    fn profile_from_output(&self, raw: &str) -> Result<BusinessProfile, ParseError> {
        let parsed: RawProfile = parse_structured(raw)?;
        if parsed.industry.trim().is_empty() {
            return Err(ParseError::Shape("industry is missing".to_string()));
        }

        let industry = IndustryLabel::normalize(&parsed.industry);
        let mut profile = BusinessProfile {
            industry,
            challenges: parsed.challenges,
            goals: parsed.goals,
            relevant_categories: parsed.relevant_categories,
            keywords: parsed.keywords,
        }
        .normalized();

        if profile.relevant_categories.is_empty() {
            profile.relevant_categories = self.registry.lookup(industry).categories.clone();
        }

        Ok(profile)
    }

    fn fallback() -> Classification {
        Classification { profile: BusinessProfile::default(), fell_back: true }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProfile {
    #[serde(default)]
    industry: String,
    #[serde(default, deserialize_with = "lenient_list")]
    challenges: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    goals: Vec<String>,
    #[serde(
        default,
        alias = "relevant_categories",
        alias = "categories",
        deserialize_with = "lenient_list"
    )]
    relevant_categories: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    keywords: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrString {
    List(Vec<String>),
    Single(String),
}

// Models sometimes answer a list field with a single comma-separated string.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ListOrString>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ListOrString::List(values)) => values,
        Some(ListOrString::Single(value)) => {
            value.split(',').map(str::trim).filter(|part| !part.is_empty()).map(String::from).collect()
        }
    })
}
