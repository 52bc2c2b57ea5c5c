use std::collections::BTreeSet;

use moduvisor_core::catalog::CatalogAccessor;
use moduvisor_core::config::{AppConfig, LlmProvider, LoadOptions};
use moduvisor_core::domain::catalog::ItemId;
use moduvisor_core::registry::PatternRegistry;
use moduvisor_db::{connect_with_settings, SqlCatalogRepository};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Exit code 1 when any check fails or is skipped.
pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_llm_readiness(&config));
            let registry = check_registry(&config);
            checks.extend(check_catalog(&config, registry.as_ref().ok()));
            checks.push(match registry {
                Ok(registry) => DoctorCheck {
                    name: "industry_registry",
                    status: CheckStatus::Pass,
                    details: format!("{} industries loaded", registry.industries().len()),
                },
                Err(details) => {
                    DoctorCheck { name: "industry_registry", status: CheckStatus::Fail, details }
                }
            });
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["llm_readiness", "database_connectivity", "catalog_readiness", "industry_registry"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

// Config validation already rejects hosted providers without a key.
fn check_llm_readiness(config: &AppConfig) -> DoctorCheck {
    let details = match config.llm.provider {
        LlmProvider::Disabled => {
            "model calls disabled; classifier and narrator use local fallbacks".to_string()
        }
        provider => format!(
            "{} model `{}` (timeout {}s, {} retries)",
            provider.as_str(),
            config.llm.model,
            config.llm.timeout_secs,
            config.llm.max_retries
        ),
    };
    DoctorCheck { name: "llm_readiness", status: CheckStatus::Pass, details }
}

fn check_registry(config: &AppConfig) -> Result<PatternRegistry, String> {
    match &config.recommendation.registry_path {
        Some(path) => PatternRegistry::with_overrides_from(path).map_err(|error| error.to_string()),
        None => Ok(PatternRegistry::builtin()),
    }
}

/// Database connectivity, then whether the catalog has active modules and
/// covers every curated registry id.
fn check_catalog(config: &AppConfig, registry: Option<&PatternRegistry>) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            }];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    DoctorCheck {
                        name: "catalog_readiness",
                        status: CheckStatus::Skipped,
                        details: "skipped because the database is unreachable".to_string(),
                    },
                ];
            }
        };

        let connectivity = DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        };
        let catalog = match SqlCatalogRepository::new(pool.clone()).list_all_items().await {
            Ok(items) => {
                let known = items.iter().map(|item| item.id).collect::<BTreeSet<_>>();
                catalog_check(known, registry)
            }
            Err(error) => DoctorCheck {
                name: "catalog_readiness",
                status: CheckStatus::Fail,
                details: format!("catalog could not be read (run `moduvisor migrate`): {error}"),
            },
        };

        pool.close().await;
        vec![connectivity, catalog]
    })
}

fn catalog_check(known: BTreeSet<ItemId>, registry: Option<&PatternRegistry>) -> DoctorCheck {
    if known.is_empty() {
        return DoctorCheck {
            name: "catalog_readiness",
            status: CheckStatus::Fail,
            details: "catalog has no active modules (run `moduvisor seed`)".to_string(),
        };
    }

    let missing = registry
        .map(|registry| missing_registry_ids(registry, &known))
        .unwrap_or_default();
    if missing.is_empty() {
        DoctorCheck {
            name: "catalog_readiness",
            status: CheckStatus::Pass,
            details: format!("{} active modules", known.len()),
        }
    } else {
        let ids = missing.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        DoctorCheck {
            name: "catalog_readiness",
            status: CheckStatus::Fail,
            details: format!("registry references modules missing from the catalog: {ids}"),
        }
    }
}

fn missing_registry_ids(registry: &PatternRegistry, known: &BTreeSet<ItemId>) -> BTreeSet<ItemId> {
    registry
        .industries()
        .into_iter()
        .flat_map(|label| registry.lookup(label).candidate_ids.clone())
        .filter(|id| !known.contains(id))
        .collect()
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
