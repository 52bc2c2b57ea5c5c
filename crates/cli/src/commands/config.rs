use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use moduvisor_core::config::AppConfig;
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::load_config;

pub fn run() -> String {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure.output,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_key, value) in effective_fields(&config) {
        let source =
            field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn effective_fields(config: &AppConfig) -> Vec<(&'static str, &'static str, String)> {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_secret(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        ("database.url", "MODUVISOR_DATABASE_URL", config.database.url.clone()),
        (
            "database.max_connections",
            "MODUVISOR_DATABASE_MAX_CONNECTIONS",
            config.database.max_connections.to_string(),
        ),
        (
            "database.timeout_secs",
            "MODUVISOR_DATABASE_TIMEOUT_SECS",
            config.database.timeout_secs.to_string(),
        ),
        ("llm.provider", "MODUVISOR_LLM_PROVIDER", config.llm.provider.as_str().to_string()),
        ("llm.model", "MODUVISOR_LLM_MODEL", config.llm.model.clone()),
        (
            "llm.base_url",
            "MODUVISOR_LLM_BASE_URL",
            config.llm.base_url.clone().unwrap_or_else(|| "<provider default>".to_string()),
        ),
        ("llm.api_key", "MODUVISOR_LLM_API_KEY", api_key),
        ("llm.timeout_secs", "MODUVISOR_LLM_TIMEOUT_SECS", config.llm.timeout_secs.to_string()),
        ("llm.max_retries", "MODUVISOR_LLM_MAX_RETRIES", config.llm.max_retries.to_string()),
        ("server.bind_address", "MODUVISOR_SERVER_BIND_ADDRESS", config.server.bind_address.clone()),
        ("server.port", "MODUVISOR_SERVER_PORT", config.server.port.to_string()),
        (
            "server.graceful_shutdown_secs",
            "MODUVISOR_SERVER_GRACEFUL_SHUTDOWN_SECS",
            config.server.graceful_shutdown_secs.to_string(),
        ),
        (
            "recommendation.limit",
            "MODUVISOR_RECOMMENDATION_LIMIT",
            config.recommendation.limit.to_string(),
        ),
        (
            "recommendation.rerank",
            "MODUVISOR_RECOMMENDATION_RERANK",
            config.recommendation.rerank.to_string(),
        ),
        (
            "recommendation.registry_path",
            "MODUVISOR_RECOMMENDATION_REGISTRY_PATH",
            config
                .recommendation
                .registry_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<built-in>".to_string()),
        ),
        (
            "recommendation.fallback_description_chars",
            "MODUVISOR_RECOMMENDATION_FALLBACK_DESCRIPTION_CHARS",
            config.recommendation.fallback_description_chars.to_string(),
        ),
        ("logging.level", "MODUVISOR_LOGGING_LEVEL", config.logging.level.clone()),
        (
            "logging.format",
            "MODUVISOR_LOGGING_FORMAT",
            format!("{:?}", config.logging.format).to_lowercase(),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("moduvisor.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/moduvisor.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a short recognizable prefix (`sk-`, `sk-ant-`) and hides the rest.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        if prefix.len() <= 4 {
            return format!("{prefix}-***");
        }
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_secret};

    #[test]
    fn secrets_keep_only_a_short_prefix() {
        assert_eq!(redact_secret("sk-live-abcdef"), "sk-***");
        assert_eq!(redact_secret("supersecretvalue-with-dash"), "<redacted>");
        assert_eq!(redact_secret("   "), "<empty>");
    }

    #[test]
    fn nested_keys_are_found_in_config_documents() {
        let doc = "[recommendation]\nlimit = 2\n".parse::<toml::Value>().expect("toml");
        assert!(contains_path(&doc, "recommendation.limit"));
        assert!(!contains_path(&doc, "recommendation.rerank"));
    }
}
