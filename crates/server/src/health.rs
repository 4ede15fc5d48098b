//! `GET /health`: can a shopper be served right now.
//!
//! The catalog is read through the same accessor the API reads from, so a
//! broken store shows up here as `503`. An empty catalog still answers `200`
//! but reports `degraded` until it is seeded.

use std::sync::Arc;

use aislefinder_core::config::SuggestionProviderKind;
use aislefinder_core::CatalogAccessor;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::api::ApiState;
use crate::carts::CartSessions;

#[derive(Clone)]
pub struct HealthState {
    catalog: Arc<dyn CatalogAccessor>,
    carts: Arc<CartSessions>,
    suggestions: SuggestionProviderKind,
}

impl HealthState {
    pub fn new(api: &ApiState, suggestions: SuggestionProviderKind) -> Self {
        Self { catalog: api.catalog(), carts: api.carts(), suggestions }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogStatus {
    Ready,
    Empty,
    Unavailable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogReadiness {
    pub status: CatalogStatus,
    pub products: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartReadiness {
    pub open: usize,
    pub capacity: usize,
    pub idle_timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub catalog: CatalogReadiness,
    pub suggestions: &'static str,
    pub carts: CartReadiness,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_readiness(state.catalog.as_ref()).await;
    let limits = state.carts.limits();

    let status_code = match catalog.status {
        CatalogStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        CatalogStatus::Ready | CatalogStatus::Empty => StatusCode::OK,
    };
    let payload = HealthResponse {
        status: if catalog.status == CatalogStatus::Ready { "ready" } else { "degraded" },
        catalog,
        suggestions: state.suggestions.as_str(),
        carts: CartReadiness {
            open: state.carts.open_count(),
            capacity: limits.max_sessions,
            idle_timeout_secs: limits.idle_timeout.as_secs(),
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    (status_code, Json(payload))
}

async fn catalog_readiness(catalog: &dyn CatalogAccessor) -> CatalogReadiness {
    match catalog.fetch_all_products().await {
        Ok(products) if products.is_empty() => CatalogReadiness {
            status: CatalogStatus::Empty,
            products: 0,
            detail: Some("catalog has no products; run `aislefinder seed`".to_string()),
        },
        Ok(products) => {
            CatalogReadiness { status: CatalogStatus::Ready, products: products.len(), detail: None }
        }
        Err(error) => {
            warn!(event_name = "system.health.catalog_unavailable", error = %error);
            CatalogReadiness {
                status: CatalogStatus::Unavailable,
                products: 0,
                detail: Some(error.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aislefinder_agent::DisabledSuggestions;
    use aislefinder_core::config::{AppConfig, SuggestionProviderKind};
    use aislefinder_core::{CatalogAccessor, CatalogError, Product, ProductId};
    use aislefinder_db::InMemoryCatalogRepository;
    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};
    use rust_decimal::Decimal;

    use crate::api::ApiState;
    use crate::carts::SharedSuggestions;
    use crate::health::{health, CatalogStatus, HealthState};

    struct BrokenStore;

    #[async_trait]
    impl CatalogAccessor for BrokenStore {
        async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError> {
            Err(CatalogError::Fetch("database is locked".to_string()))
        }

        async fn fetch_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
            Err(CatalogError::NotFound(id.clone()))
        }
    }

    fn state(catalog: Arc<dyn CatalogAccessor>) -> State<HealthState> {
        let suggestions: SharedSuggestions = Arc::new(DisabledSuggestions);
        let api = ApiState::new(catalog, suggestions, &AppConfig::default());
        State(HealthState::new(&api, SuggestionProviderKind::Disabled))
    }

    #[tokio::test]
    async fn seeded_catalog_is_ready_with_a_product_count() {
        let catalog = Arc::new(InMemoryCatalogRepository::with_products(vec![
            Product::new("P100", "Whole Milk", Decimal::new(299, 2)),
            Product::new("P200", "Corn Flakes", Decimal::new(410, 2)),
        ]));

        let (status, Json(payload)) = health(state(catalog)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.catalog.status, CatalogStatus::Ready);
        assert_eq!(payload.catalog.products, 2);
        assert_eq!(payload.suggestions, "disabled");
        assert_eq!(payload.carts.open, 0);
        assert_eq!(payload.carts.capacity, 1000);
    }

    #[tokio::test]
    async fn empty_catalog_answers_but_is_degraded() {
        let catalog = Arc::new(InMemoryCatalogRepository::with_products(Vec::new()));

        let (status, Json(payload)) = health(state(catalog)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.catalog.status, CatalogStatus::Empty);
        assert!(payload.catalog.detail.unwrap_or_default().contains("aislefinder seed"));
    }

    #[tokio::test]
    async fn unreachable_catalog_is_service_unavailable() {
        let (status, Json(payload)) = health(state(Arc::new(BrokenStore))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.catalog.status, CatalogStatus::Unavailable);
        assert!(payload.catalog.detail.unwrap_or_default().contains("database is locked"));
    }
}
