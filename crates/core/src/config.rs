use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::DEFAULT_TAX_RATE;
use crate::recommendations::{
    DEFAULT_DEBOUNCE, DEFAULT_FALLBACK_SAMPLE_SIZE, DEFAULT_MAX_SUGGESTIONS,
};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub suggestions: SuggestionsConfig,
    pub server: ServerConfig,
    pub pricing: PricingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SuggestionsConfig {
    pub provider: SuggestionProviderKind,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_suggestions: usize,
    pub debounce_ms: u64,
    pub fallback_sample_size: usize,
}

impl SuggestionsConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    pub cart_idle_secs: u64,
    pub max_cart_sessions: usize,
}

impl ServerConfig {
    pub fn cart_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.cart_idle_secs)
    }
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub tax_rate: Decimal,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
    Disabled,
}

impl SuggestionProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::Disabled => "disabled",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub suggestions_provider: Option<SuggestionProviderKind>,
    pub suggestions_model: Option<String>,
    pub suggestions_api_key: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub tax_rate: Option<Decimal>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://aislefinder.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            suggestions: SuggestionsConfig {
                provider: SuggestionProviderKind::Disabled,
                api_key: None,
                base_url: None,
                model: "gpt-3.5-turbo-0125".to_string(),
                timeout_secs: 15,
                max_suggestions: DEFAULT_MAX_SUGGESTIONS,
                debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
                fallback_sample_size: DEFAULT_FALLBACK_SAMPLE_SIZE,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
                cart_idle_secs: 1800,
                max_cart_sessions: 1000,
            },
            pricing: PricingConfig { tax_rate: DEFAULT_TAX_RATE },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl FromStr for SuggestionProviderKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "disabled" | "none" => Ok(Self::Disabled),
            other => Err(ConfigError::Validation(format!(
                "unsupported suggestions provider `{other}` (expected openai|ollama|disabled)"
            ))),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("aislefinder.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(suggestions) = patch.suggestions {
            if let Some(provider) = suggestions.provider {
                self.suggestions.provider = provider;
            }
            if let Some(api_key) = suggestions.api_key {
                self.suggestions.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = suggestions.base_url {
                self.suggestions.base_url = Some(base_url);
            }
            if let Some(model) = suggestions.model {
                self.suggestions.model = model;
            }
            if let Some(timeout_secs) = suggestions.timeout_secs {
                self.suggestions.timeout_secs = timeout_secs;
            }
            if let Some(max_suggestions) = suggestions.max_suggestions {
                self.suggestions.max_suggestions = max_suggestions;
            }
            if let Some(debounce_ms) = suggestions.debounce_ms {
                self.suggestions.debounce_ms = debounce_ms;
            }
            if let Some(fallback_sample_size) = suggestions.fallback_sample_size {
                self.suggestions.fallback_sample_size = fallback_sample_size;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(cart_idle_secs) = server.cart_idle_secs {
                self.server.cart_idle_secs = cart_idle_secs;
            }
            if let Some(max_cart_sessions) = server.max_cart_sessions {
                self.server.max_cart_sessions = max_cart_sessions;
            }
        }

        if let Some(tax_rate) = patch.pricing.and_then(|pricing| pricing.tax_rate) {
            self.pricing.tax_rate = tax_rate;
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("AISLEFINDER_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("AISLEFINDER_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("AISLEFINDER_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("AISLEFINDER_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("AISLEFINDER_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("AISLEFINDER_SUGGESTIONS_PROVIDER") {
            self.suggestions.provider = value.parse()?;
        }
        if let Some(value) = read_env("AISLEFINDER_SUGGESTIONS_API_KEY") {
            self.suggestions.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("AISLEFINDER_SUGGESTIONS_BASE_URL") {
            self.suggestions.base_url = Some(value);
        }
        if let Some(value) = read_env("AISLEFINDER_SUGGESTIONS_MODEL") {
            self.suggestions.model = value;
        }
        if let Some(value) = read_env("AISLEFINDER_SUGGESTIONS_TIMEOUT_SECS") {
            self.suggestions.timeout_secs =
                parse_env("AISLEFINDER_SUGGESTIONS_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("AISLEFINDER_SUGGESTIONS_MAX_SUGGESTIONS") {
            self.suggestions.max_suggestions =
                parse_env("AISLEFINDER_SUGGESTIONS_MAX_SUGGESTIONS", &value)?;
        }
        if let Some(value) = read_env("AISLEFINDER_SUGGESTIONS_DEBOUNCE_MS") {
            self.suggestions.debounce_ms =
                parse_env("AISLEFINDER_SUGGESTIONS_DEBOUNCE_MS", &value)?;
        }
        if let Some(value) = read_env("AISLEFINDER_SUGGESTIONS_FALLBACK_SAMPLE_SIZE") {
            self.suggestions.fallback_sample_size =
                parse_env("AISLEFINDER_SUGGESTIONS_FALLBACK_SAMPLE_SIZE", &value)?;
        }

        if let Some(value) = read_env("AISLEFINDER_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("AISLEFINDER_SERVER_PORT") {
            self.server.port = parse_env("AISLEFINDER_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("AISLEFINDER_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_env("AISLEFINDER_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("AISLEFINDER_SERVER_CART_IDLE_SECS") {
            self.server.cart_idle_secs = parse_env("AISLEFINDER_SERVER_CART_IDLE_SECS", &value)?;
        }
        if let Some(value) = read_env("AISLEFINDER_SERVER_MAX_CART_SESSIONS") {
            self.server.max_cart_sessions =
                parse_env("AISLEFINDER_SERVER_MAX_CART_SESSIONS", &value)?;
        }

        if let Some(value) = read_env("AISLEFINDER_PRICING_TAX_RATE") {
            self.pricing.tax_rate = parse_env("AISLEFINDER_PRICING_TAX_RATE", &value)?;
        }

        let log_level =
            read_env("AISLEFINDER_LOGGING_LEVEL").or_else(|| read_env("AISLEFINDER_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("AISLEFINDER_LOGGING_FORMAT").or_else(|| read_env("AISLEFINDER_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(provider) = overrides.suggestions_provider {
            self.suggestions.provider = provider;
        }
        if let Some(model) = overrides.suggestions_model {
            self.suggestions.model = model;
        }
        if let Some(api_key) = overrides.suggestions_api_key {
            self.suggestions.api_key = Some(secret_value(api_key));
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(tax_rate) = overrides.tax_rate {
            self.pricing.tax_rate = tax_rate;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_suggestions(&self.suggestions)?;
        validate_server(&self.server)?;
        validate_pricing(&self.pricing)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("aislefinder.toml"), PathBuf::from("config/aislefinder.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_suggestions(suggestions: &SuggestionsConfig) -> Result<(), ConfigError> {
    if suggestions.timeout_secs == 0 || suggestions.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "suggestions.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if suggestions.max_suggestions == 0 {
        return Err(ConfigError::Validation(
            "suggestions.max_suggestions must be greater than zero".to_string(),
        ));
    }

    match suggestions.provider {
        SuggestionProviderKind::OpenAi => {
            let missing = suggestions
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "suggestions.api_key is required for the openai provider \
                     (set AISLEFINDER_SUGGESTIONS_API_KEY or use provider = \"disabled\")"
                        .to_string(),
                ));
            }
        }
        SuggestionProviderKind::Ollama => {
            let missing =
                suggestions.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "suggestions.base_url is required for the ollama provider \
                     (e.g. http://localhost:11434)"
                        .to_string(),
                ));
            }
        }
        SuggestionProviderKind::Disabled => {}
    }

    if let Some(base_url) = &suggestions.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "suggestions.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    if server.cart_idle_secs == 0 {
        return Err(ConfigError::Validation(
            "server.cart_idle_secs must be greater than zero".to_string(),
        ));
    }

    if server.max_cart_sessions == 0 {
        return Err(ConfigError::Validation(
            "server.max_cart_sessions must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    if pricing.tax_rate.is_sign_negative() || pricing.tax_rate >= Decimal::ONE {
        return Err(ConfigError::Validation(
            "pricing.tax_rate must be a fraction in range 0..1 (e.g. 0.08 for 8%)".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    suggestions: Option<SuggestionsPatch>,
    server: Option<ServerPatch>,
    pricing: Option<PricingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SuggestionsPatch {
    provider: Option<SuggestionProviderKind>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_suggestions: Option<usize>,
    debounce_ms: Option<u64>,
    fallback_sample_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    cart_idle_secs: Option<u64>,
    max_cart_sessions: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    tax_rate: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
