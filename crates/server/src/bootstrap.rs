use std::sync::Arc;

use moduvisor_agent::llm::{build_llm_client, LlmError};
use moduvisor_agent::runtime::{PipelineSettings, RecommendationPipeline};
use moduvisor_core::config::{AppConfig, ConfigError, LoadOptions};
use moduvisor_core::registry::{PatternRegistry, RegistryError};
use moduvisor_db::{connect_with_settings, migrations, DbPool, SqlCatalogRepository};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub pipeline: Arc<RecommendationPipeline>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("industry registry could not be loaded: {0}")]
    Registry(#[from] RegistryError),
    #[error("llm client could not be created: {0}")]
    Llm(#[from] LlmError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let registry = match &config.recommendation.registry_path {
        Some(path) => PatternRegistry::with_overrides_from(path)?,
        None => PatternRegistry::builtin(),
    };
    let llm = build_llm_client(&config.llm)?;
    info!(
        event_name = "system.bootstrap.pipeline_ready",
        correlation_id = "bootstrap",
        llm_provider = config.llm.provider.as_str(),
        llm_model = %config.llm.model,
        industries = registry.industries().len(),
        limit = config.recommendation.limit,
        "recommendation pipeline assembled"
    );

    let pipeline = RecommendationPipeline::new(
        llm,
        Arc::new(SqlCatalogRepository::new(db_pool.clone())),
        Arc::new(registry),
        PipelineSettings::from_config(&config),
    );

    Ok(Application { config, db_pool, pipeline: Arc::new(pipeline) })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use moduvisor_core::config::{ConfigOverrides, LlmProvider, LoadOptions};
    use moduvisor_core::domain::conversation::{Conversation, RecommendationRequest};
    use moduvisor_core::domain::recommendation::RecommendationOutcome;
    use moduvisor_db::seed_demo_catalog;
    use tempfile::TempDir;

    use super::{bootstrap, BootstrapError};

    fn offline_options(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                llm_provider: Some(LlmProvider::Disabled),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    fn temp_database(dir: &TempDir) -> String {
        format!("sqlite://{}?mode=rwc", dir.path().join("moduvisor.db").display())
    }

    #[tokio::test]
    async fn bootstrap_wires_pipeline_against_seeded_database() {
        let dir = TempDir::new().expect("tempdir");
        let app = bootstrap(offline_options(&temp_database(&dir))).await.expect("bootstrap");
        seed_demo_catalog(&app.db_pool).await.expect("seed");

        let conversation = Conversation::from_user_texts(["We need help"]).expect("conversation");
        let result = app.pipeline.recommend(&RecommendationRequest::new(conversation), "req-boot").await;

        assert_eq!(result.outcome, RecommendationOutcome::Degraded);
        assert_eq!(result.items.len(), app.config.recommendation.limit);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_rejects_unknown_registry_rows() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("registry.toml");
        fs::write(&path, "[[industry]]\nlabel = \"spaceflight\"\ncandidate_ids = [1]\n")
            .expect("write registry");

        let mut options = offline_options(&temp_database(&dir));
        options.overrides.registry_path = Some(path);

        let result = bootstrap(options).await;
        assert!(matches!(result, Err(BootstrapError::Registry(_))));
    }
}
