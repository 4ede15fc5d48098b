use std::sync::Arc;

use aislefinder_agent::provider_from_config;
use aislefinder_core::config::{AppConfig, ConfigError};
use aislefinder_core::CatalogAccessor;
use aislefinder_db::{connect_with_config, migrations, DbPool, SqlCatalogRepository};
use thiserror::Error;
use tracing::info;

use crate::api::ApiState;
use crate::carts::SharedSuggestions;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: Arc<dyn CatalogAccessor>,
    pub suggestions: SharedSuggestions,
}

impl Application {
    pub fn api_state(&self) -> ApiState {
        ApiState::new(Arc::clone(&self.catalog), Arc::clone(&self.suggestions), &self.config)
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("suggestion provider setup failed: {0}")]
    Suggestions(String),
}

#[cfg(test)]
pub async fn bootstrap(
    options: aislefinder_core::config::LoadOptions,
) -> Result<Application, BootstrapError> {
    bootstrap_with_config(AppConfig::load(options)?).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
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

    let suggestions = provider_from_config(&config.suggestions)
        .map_err(|error| BootstrapError::Suggestions(format!("{error:#}")))?;

    Ok(Application {
        catalog: Arc::new(SqlCatalogRepository::new(db_pool.clone())),
        config,
        db_pool,
        suggestions,
    })
}
