//! JSON API consumed by the chat front end.
//!
//! - `POST /api/analyze`: conversation texts → business profile
//! - `POST /api/chat`: chat turns plus already-shown ids → narrative and items

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use moduvisor_agent::runtime::RecommendationPipeline;
use moduvisor_core::domain::catalog::{CatalogItem, ItemId};
use moduvisor_core::domain::conversation::{Conversation, ConversationTurn, RecommendationRequest};
use moduvisor_core::domain::profile::BusinessProfile;
use moduvisor_core::errors::{ApplicationError, InterfaceError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    pipeline: Arc<RecommendationPipeline>,
}

impl ApiState {
    pub fn new(pipeline: Arc<RecommendationPipeline>) -> Self {
        Self { pipeline }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub conversation: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ConversationTurn>,
    #[serde(default)]
    pub already_shown_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub text: String,
    pub recommended_items: Vec<CatalogItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error: String,
    pub detail: String,
    pub correlation_id: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/chat", post(chat))
        .with_state(state)
}

pub async fn analyze(
    State(state): State<ApiState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<BusinessProfile> {
    let correlation_id = new_correlation_id();
    let Json(body) = body.map_err(|rejection| malformed_body(rejection, &correlation_id))?;

    let conversation = Conversation::from_user_texts(body.conversation)
        .map_err(|error| reject(ApplicationError::from(error).into_interface(&correlation_id)))?;

    let profile = state.pipeline.analyze(&conversation, &correlation_id).await;
    info!(
        event_name = "api.analyze.completed",
        correlation_id = %correlation_id,
        industry = profile.industry.as_str(),
        "analyze request served"
    );
    Ok(Json(profile))
}

pub async fn chat(
    State(state): State<ApiState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let correlation_id = new_correlation_id();
    let Json(body) = body.map_err(|rejection| malformed_body(rejection, &correlation_id))?;

    let conversation = Conversation::new(body.messages)
        .map_err(|error| reject(ApplicationError::from(error).into_interface(&correlation_id)))?;
    let request = RecommendationRequest::new(conversation)
        .with_excluded_ids(body.already_shown_ids.into_iter().map(ItemId));

    let result = state.pipeline.recommend(&request, &correlation_id).await;
    info!(
        event_name = "api.chat.completed",
        correlation_id = %correlation_id,
        excluded = request.excluded_ids.len(),
        items = result.items.len(),
        outcome = ?result.outcome,
        "chat request served"
    );

    Ok(Json(ChatResponse { text: result.narrative, recommended_items: result.items }))
}

fn new_correlation_id() -> String {
    format!("req-{}", Uuid::new_v4().simple())
}

fn malformed_body(rejection: JsonRejection, correlation_id: &str) -> (StatusCode, Json<ApiError>) {
    reject(InterfaceError::BadRequest {
        message: rejection.body_text(),
        correlation_id: correlation_id.to_string(),
    })
}

fn reject(error: InterfaceError) -> (StatusCode, Json<ApiError>) {
    let status = match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
    };
    warn!(
        event_name = "api.request.rejected",
        correlation_id = error.correlation_id(),
        status = status.as_u16(),
        error = %error,
        "request rejected"
    );

    (
        status,
        Json(ApiError {
            error: error.user_message().to_string(),
            detail: error.to_string(),
            correlation_id: error.correlation_id().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use moduvisor_agent::llm::{CallPolicy, DisabledLlmClient};
    use moduvisor_agent::runtime::{PipelineSettings, RecommendationPipeline};
    use moduvisor_core::domain::catalog::ItemId;
    use moduvisor_core::domain::conversation::ConversationTurn;
    use moduvisor_core::domain::profile::IndustryLabel;
    use moduvisor_core::markers::extract_marker_ids;
    use moduvisor_core::registry::PatternRegistry;
    use moduvisor_db::{demo_catalog, InMemoryCatalog};

    use super::*;

    fn state() -> ApiState {
        let settings = PipelineSettings {
            call_policy: CallPolicy { max_retries: 0, ..CallPolicy::default() },
            ..PipelineSettings::default()
        };
        let pipeline = RecommendationPipeline::new(
            Arc::new(DisabledLlmClient),
            Arc::new(InMemoryCatalog::new(demo_catalog())),
            Arc::new(PatternRegistry::builtin()),
            settings,
        );
        ApiState::new(Arc::new(pipeline))
    }

    #[tokio::test]
    async fn analyze_returns_default_profile_when_model_is_disabled() {
        let body = AnalyzeRequest { conversation: vec!["We run a small bakery".to_string()] };

        let Json(profile) = analyze(State(state()), Ok(Json(body))).await.expect("profile");

        assert_eq!(profile.industry, IndustryLabel::General);
        assert!(!profile.relevant_categories.is_empty());
    }

    #[tokio::test]
    async fn analyze_rejects_blank_conversation() {
        let body = AnalyzeRequest { conversation: vec!["   ".to_string()] };

        let (status, Json(error)) =
            analyze(State(state()), Ok(Json(body))).await.expect_err("blank conversation");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error.correlation_id.starts_with("req-"));
        assert!(error.error.contains("Check inputs"));
    }

    #[tokio::test]
    async fn chat_returns_items_matching_markers_and_skips_shown_ids() {
        let body = ChatRequest {
            messages: vec![
                ConversationTurn::user("We sell handmade soap"),
                ConversationTurn::assistant("Tell me more about your customers."),
                ConversationTurn::user("Mostly repeat buyers who message us"),
            ],
            already_shown_ids: vec![9],
        };

        let Json(response) = chat(State(state()), Ok(Json(body))).await.expect("chat response");

        let ids = response.recommended_items.iter().map(|item| item.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![ItemId(5), ItemId(12), ItemId(23)]);
        assert_eq!(extract_marker_ids(&response.text), ids);
    }

    #[tokio::test]
    async fn chat_without_user_turn_is_bad_request() {
        let body = ChatRequest {
            messages: vec![ConversationTurn::assistant("Hi! What does your business do?")],
            already_shown_ids: Vec::new(),
        };

        let (status, Json(error)) =
            chat(State(state()), Ok(Json(body))).await.expect_err("no user turn");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error.detail.contains("user turn"));
    }

    #[test]
    fn chat_request_uses_camel_case_keys() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"messages": [{"role": "user", "text": "hi"}], "alreadyShownIds": [3, 16]}"#,
        )
        .expect("parse request");

        assert_eq!(request.already_shown_ids, vec![3, 16]);
        let response = serde_json::to_value(ChatResponse {
            text: String::new(),
            recommended_items: Vec::new(),
        })
        .expect("serialize");
        assert!(response.get("recommendedItems").is_some());
    }
}
