use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use aislefinder_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let api_key = if config.suggestions.api_key.is_some() { "<redacted>" } else { "<unset>" };
    let rows = vec![
        row("database.url", &config.database.url, &["AISLEFINDER_DATABASE_URL"]),
        row(
            "database.max_connections",
            config.database.max_connections,
            &["AISLEFINDER_DATABASE_MAX_CONNECTIONS"],
        ),
        row(
            "database.timeout_secs",
            config.database.timeout_secs,
            &["AISLEFINDER_DATABASE_TIMEOUT_SECS"],
        ),
        row(
            "suggestions.provider",
            config.suggestions.provider.as_str(),
            &["AISLEFINDER_SUGGESTIONS_PROVIDER"],
        ),
        row("suggestions.model", &config.suggestions.model, &["AISLEFINDER_SUGGESTIONS_MODEL"]),
        row(
            "suggestions.base_url",
            config.suggestions.base_url.as_deref().unwrap_or("<unset>"),
            &["AISLEFINDER_SUGGESTIONS_BASE_URL"],
        ),
        row("suggestions.api_key", api_key, &["AISLEFINDER_SUGGESTIONS_API_KEY"]),
        row(
            "suggestions.timeout_secs",
            config.suggestions.timeout_secs,
            &["AISLEFINDER_SUGGESTIONS_TIMEOUT_SECS"],
        ),
        row(
            "suggestions.max_suggestions",
            config.suggestions.max_suggestions,
            &["AISLEFINDER_SUGGESTIONS_MAX_SUGGESTIONS"],
        ),
        row(
            "suggestions.debounce_ms",
            config.suggestions.debounce_ms,
            &["AISLEFINDER_SUGGESTIONS_DEBOUNCE_MS"],
        ),
        row(
            "suggestions.fallback_sample_size",
            config.suggestions.fallback_sample_size,
            &["AISLEFINDER_SUGGESTIONS_FALLBACK_SAMPLE_SIZE"],
        ),
        row(
            "server.bind_address",
            &config.server.bind_address,
            &["AISLEFINDER_SERVER_BIND_ADDRESS"],
        ),
        row("server.port", config.server.port, &["AISLEFINDER_SERVER_PORT"]),
        row(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs,
            &["AISLEFINDER_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        row(
            "server.cart_idle_secs",
            config.server.cart_idle_secs,
            &["AISLEFINDER_SERVER_CART_IDLE_SECS"],
        ),
        row(
            "server.max_cart_sessions",
            config.server.max_cart_sessions,
            &["AISLEFINDER_SERVER_MAX_CART_SESSIONS"],
        ),
        row("pricing.tax_rate", config.pricing.tax_rate, &["AISLEFINDER_PRICING_TAX_RATE"]),
        row(
            "logging.level",
            &config.logging.level,
            &["AISLEFINDER_LOGGING_LEVEL", "AISLEFINDER_LOG_LEVEL"],
        ),
        row(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["AISLEFINDER_LOGGING_FORMAT", "AISLEFINDER_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(
        rows.into_iter()
            .map(|(key, value, env_keys)| render_line(key, &value, source(key, env_keys))),
    );
    lines.join("\n")
}

fn row(
    key: &'static str,
    value: impl Display,
    env_keys: &'static [&'static str],
) -> (&'static str, String, &'static [&'static str]) {
    (key, value.to_string(), env_keys)
}

fn detect_config_path() -> Option<PathBuf> {
    ["aislefinder.toml", "config/aislefinder.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
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

#[cfg(test)]
mod tests {
    use super::contains_path;

    #[test]
    fn nested_keys_are_found_only_when_every_segment_exists() {
        let doc: toml::Value = "[pricing]\ntax_rate = \"0.05\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "pricing.tax_rate"));
        assert!(!contains_path(&doc, "pricing.currency"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
