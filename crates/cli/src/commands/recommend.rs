use std::sync::Arc;

use moduvisor_agent::llm::build_llm_client;
use moduvisor_agent::runtime::{PipelineSettings, RecommendationPipeline};
use moduvisor_core::catalog::CatalogAccessor;
use moduvisor_core::config::AppConfig;
use moduvisor_core::domain::catalog::ItemId;
use moduvisor_core::domain::conversation::{Conversation, RecommendationRequest};
use moduvisor_core::registry::PatternRegistry;
use moduvisor_db::{
    connect_with_settings, demo_catalog, migrations, InMemoryCatalog, SqlCatalogRepository,
};

use crate::commands::{build_runtime, load_config, CommandResult};

const COMMAND: &str = "recommend";
const CORRELATION_ID: &str = "cli-recommend";

pub fn run(texts: Vec<String>, exclude: Vec<i64>, demo: bool) -> CommandResult {
    let conversation = match Conversation::from_user_texts(texts) {
        Ok(conversation) => conversation,
        Err(error) => {
            return CommandResult::failure(COMMAND, "input_validation", error.to_string(), 2);
        }
    };
    let request = RecommendationRequest::new(conversation)
        .with_excluded_ids(exclude.into_iter().map(ItemId));

    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let registry = match &config.recommendation.registry_path {
        Some(path) => match PatternRegistry::with_overrides_from(path) {
            Ok(registry) => registry,
            Err(error) => {
                return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2);
            }
        },
        None => PatternRegistry::builtin(),
    };
    let llm = match build_llm_client(&config.llm) {
        Ok(llm) => llm,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("llm client could not be created: {error}"),
                2,
            );
        }
    };
    let runtime = match build_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    runtime.block_on(async move {
        let catalog = match open_catalog(&config, demo).await {
            Ok(catalog) => catalog,
            Err(result) => return result,
        };
        let pipeline = RecommendationPipeline::new(
            llm,
            catalog,
            Arc::new(registry),
            PipelineSettings::from_config(&config),
        );

        let result = pipeline.recommend(&request, CORRELATION_ID).await;
        let message =
            format!("{} modules recommended for {}", result.items.len(), result.profile.industry);
        match serde_json::to_value(&result) {
            Ok(data) => CommandResult::success_with_data(COMMAND, message, Some(data)),
            Err(error) => CommandResult::failure(
                COMMAND,
                "serialization",
                format!("recommendation could not be serialized: {error}"),
                3,
            ),
        }
    })
}

async fn open_catalog(
    config: &AppConfig,
    demo: bool,
) -> Result<Arc<dyn CatalogAccessor>, CommandResult> {
    if demo {
        return Ok(Arc::new(InMemoryCatalog::new(demo_catalog())));
    }

    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| {
        CommandResult::failure(
            COMMAND,
            "db_connectivity",
            format!("failed to connect to database: {error}"),
            4,
        )
    })?;

    migrations::run_pending(&pool).await.map_err(|error| {
        CommandResult::failure(COMMAND, "migration", format!("failed to apply migrations: {error}"), 5)
    })?;

    Ok(Arc::new(SqlCatalogRepository::new(pool)))
}
