use crate::commands::{build_runtime, load_config, CommandResult};
use moduvisor_db::{connect_with_settings, migrations, seed_demo_catalog, SeedResult};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seeded = seed_demo_catalog(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<SeedResult, (&'static str, String, u8)>(seeded)
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", seed_message(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_message(seeded: &SeedResult) -> String {
    format!(
        "demo catalog loaded: {} modules, {} industries",
        seeded.modules_seeded, seeded.industries_seeded
    )
}

#[cfg(test)]
mod tests {
    use moduvisor_db::SeedResult;

    use super::seed_message;

    #[test]
    fn seed_message_reports_counts() {
        let message = seed_message(&SeedResult { modules_seeded: 44, industries_seeded: 16 });
        assert_eq!(message, "demo catalog loaded: 44 modules, 16 industries");
    }
}
