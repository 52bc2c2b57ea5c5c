use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use moduvisor_db::{ping, DbPool, SqlCatalogRepository};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

impl HealthState {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let catalog = catalog_check(&state.db_pool).await;
    let ready = database.status == "ready" && catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "moduvisor-server runtime initialized".to_string(),
        },
        database,
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match ping(pool).await {
        Ok(()) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

// An empty catalog means every recommendation would come back empty.
async fn catalog_check(pool: &DbPool) -> HealthCheck {
    match SqlCatalogRepository::new(pool.clone()).count_active().await {
        Ok(0) => HealthCheck {
            status: "degraded",
            detail: "catalog has no active modules; run `moduvisor seed`".to_string(),
        },
        Ok(count) => HealthCheck { status: "ready", detail: format!("{count} active modules") },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("catalog query failed: {error}") }
        }
    }
}
