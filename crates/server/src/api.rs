//! Shopper JSON API.
//!
//! Catalog endpoints:
//! - `GET  /api/v1/products?q=`              - list, or search names when `q` is given
//! - `GET  /api/v1/products/{id}`            - product detail
//! - `GET  /api/v1/products/{id}/location`   - aisle and shelf
//! - `POST /api/v1/products/{id}/verify`     - compare a decoded scan with the product
//!
//! Cart endpoints:
//! - `POST   /api/v1/carts`                  - open a cart session
//! - `POST   /api/v1/carts/{cart_id}/items`  - append an entry, restart recommendations
//! - `GET    /api/v1/carts/{cart_id}`        - resolved items and order summary
//! - `GET    /api/v1/carts/{cart_id}/showcase` - recommendations or featured sample
//! - `DELETE /api/v1/carts/{cart_id}`        - close the session

use std::sync::Arc;

use aislefinder_core::config::AppConfig;
use aislefinder_core::recommendations::showcase;
use aislefinder_core::{
    load_catalog, lookup_scanned, resolve, verify_scan, ApplicationError, CartEntry, Catalog,
    CatalogAccessor, FixedRateSummarizer, InterfaceError, OrderSummary, PricingSummarizer,
    Product, ProductId, ProductLocation, RecommendationEngine, RecommendationSet,
    ResolvedCartItem, ScanVerification, Showcase,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::carts::{CartLimits, CartSessions, SharedSuggestions};

#[derive(Clone)]
pub struct ApiState {
    catalog: Arc<dyn CatalogAccessor>,
    carts: Arc<CartSessions>,
    summarizer: FixedRateSummarizer,
    fallback_sample_size: usize,
}

impl ApiState {
    pub fn new(
        catalog: Arc<dyn CatalogAccessor>,
        suggestions: SharedSuggestions,
        config: &AppConfig,
    ) -> Self {
        let engine = RecommendationEngine::new(suggestions)
            .with_max_suggestions(config.suggestions.max_suggestions);
        Self {
            catalog,
            carts: Arc::new(CartSessions::new(
                engine,
                config.suggestions.debounce(),
                CartLimits::from(&config.server),
            )),
            summarizer: FixedRateSummarizer::new(config.pricing.tax_rate),
            fallback_sample_size: config.suggestions.fallback_sample_size,
        }
    }

    pub fn catalog(&self) -> Arc<dyn CatalogAccessor> {
        Arc::clone(&self.catalog)
    }

    pub fn carts(&self) -> Arc<CartSessions> {
        Arc::clone(&self.carts)
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub payload: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    #[serde(flatten)]
    pub verification: ScanVerification,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanned_product: Option<Product>,
}

#[derive(Debug, Serialize)]
pub struct CartCreated {
    pub cart_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CartItemAdded {
    pub cart_id: Uuid,
    pub item_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub cart_id: Uuid,
    pub items: Vec<ResolvedCartItem>,
    pub dropped: Vec<ProductId>,
    pub summary: OrderSummary,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
}

#[derive(Debug, Serialize)]
pub struct ShowcaseView {
    pub headline: String,
    #[serde(flatten)]
    pub showcase: Showcase,
}

#[derive(Debug, Serialize)]
pub struct CartClosed {
    pub cart_id: Uuid,
    pub cancelled_pending: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorBody,
}

impl ApiError {
    fn application(error: impl Into<ApplicationError>) -> Self {
        Self::from(error.into().into_interface(Uuid::new_v4().to_string()))
    }

    fn unknown_cart(cart_id: Uuid) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ApiErrorBody {
                error: format!("cart `{cart_id}` does not exist"),
                correlation_id: cart_id.to_string(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<InterfaceError> for ApiError {
    fn from(error: InterfaceError) -> Self {
        let status = match &error {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!(
            event_name = "server.api.request_failed",
            correlation_id = %error.correlation_id(),
            status = status.as_u16(),
            error = %error,
            "api request failed"
        );
        Self {
            status,
            body: ApiErrorBody {
                error: error.user_message().to_string(),
                correlation_id: error.correlation_id().to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/{id}", get(product_detail))
        .route("/api/v1/products/{id}/location", get(product_location))
        .route("/api/v1/products/{id}/verify", post(verify_product))
        .route("/api/v1/carts", post(create_cart))
        .route("/api/v1/carts/{cart_id}", get(view_cart).delete(close_cart))
        .route("/api/v1/carts/{cart_id}/items", post(add_cart_item))
        .route("/api/v1/carts/{cart_id}/showcase", get(cart_showcase))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Catalog handlers
// ---------------------------------------------------------------------------

async fn list_products(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Product>> {
    let catalog = load_catalog(state.catalog.as_ref()).await;
    let products = match query.q {
        Some(q) => catalog.search(&q).into_iter().cloned().collect(),
        None => catalog.products().to_vec(),
    };
    Json(products)
}

async fn product_detail(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product =
        state.catalog.fetch_product(&ProductId::new(id)).await.map_err(ApiError::application)?;
    Ok(Json(product))
}

async fn product_location(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ProductLocation>, ApiError> {
    let product =
        state.catalog.fetch_product(&ProductId::new(id)).await.map_err(ApiError::application)?;
    Ok(Json(ProductLocation::from(&product)))
}

async fn verify_product(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let expected =
        state.catalog.fetch_product(&ProductId::new(id)).await.map_err(ApiError::application)?;
    let verification = verify_scan(&expected.id, &body.payload);

    let scanned_product = if verification.is_verified() {
        None
    } else {
        lookup_scanned(state.catalog.as_ref(), &body.payload).await.ok()
    };

    info!(
        event_name = "server.scan.verified",
        product_id = %expected.id,
        verified = verification.is_verified(),
        "scan compared with product"
    );
    Ok(Json(VerifyResponse { message: verification.message(), verification, scanned_product }))
}

// ---------------------------------------------------------------------------
// Cart handlers
// ---------------------------------------------------------------------------

async fn create_cart(State(state): State<ApiState>) -> (StatusCode, Json<CartCreated>) {
    let catalog = load_catalog(state.catalog.as_ref()).await;
    let cart_id = state.carts.open(catalog);
    (StatusCode::CREATED, Json(CartCreated { cart_id }))
}

async fn add_cart_item(
    State(state): State<ApiState>,
    Path(cart_id): Path<Uuid>,
    Json(entry): Json<CartEntry>,
) -> Result<Json<CartItemAdded>, ApiError> {
    entry.validate().map_err(ApiError::application)?;
    let item_count =
        state.carts.add(cart_id, entry).ok_or_else(|| ApiError::unknown_cart(cart_id))?;
    Ok(Json(CartItemAdded { cart_id, item_count }))
}

async fn view_cart(
    State(state): State<ApiState>,
    Path(cart_id): Path<Uuid>,
) -> Result<Json<CartView>, ApiError> {
    let entries =
        state.carts.entries(cart_id).ok_or_else(|| ApiError::unknown_cart(cart_id))?;
    let catalog = load_catalog(state.catalog.as_ref()).await;

    let resolution = resolve(&entries, &catalog);
    let summary = state.summarizer.summarize(&resolution.items);
    Ok(Json(CartView {
        cart_id,
        subtotal: summary.display_subtotal(),
        tax: summary.display_tax(),
        total: summary.display_total(),
        items: resolution.items,
        dropped: resolution.dropped,
        summary,
    }))
}

async fn cart_showcase(
    State(state): State<ApiState>,
    Path(cart_id): Path<Uuid>,
) -> Result<Json<ShowcaseView>, ApiError> {
    let (set, catalog) = state
        .carts
        .recommendations(cart_id)
        .ok_or_else(|| ApiError::unknown_cart(cart_id))?;
    Ok(Json(showcase_view(&set, &catalog, state.fallback_sample_size)))
}

fn showcase_view(
    set: &RecommendationSet,
    catalog: &Catalog,
    fallback_size: usize,
) -> ShowcaseView {
    let showcase = showcase(set, catalog, fallback_size, &mut rand::thread_rng());
    ShowcaseView { headline: showcase.headline(), showcase }
}

async fn close_cart(
    State(state): State<ApiState>,
    Path(cart_id): Path<Uuid>,
) -> Result<Json<CartClosed>, ApiError> {
    let cancelled_pending =
        state.carts.close(cart_id).ok_or_else(|| ApiError::unknown_cart(cart_id))?;
    Ok(Json(CartClosed { cart_id, cancelled_pending }))
}
