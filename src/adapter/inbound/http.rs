//! HTTP API handlers and routes using axum.
//!
//! Routes:
//! - GET /health - Health check
//! - POST /trades/enrich - Stream trade CSV in, stream enriched trade CSV out
//! - GET /products/:id/name - Product name, or a not-found message
//! - DELETE /products/:id - Invalidate a cached product
//! - POST /products/batch - Resolve a JSON list of ids
//! - POST /products/load - Load product CSV into the cache and the projection
//! - GET /cache/stats - Cache counters

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use tokio::io::BufReader;
use tokio_util::io::StreamReader;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::decoder::{decode_products, decode_trades, encode_enriched_trade, ENRICHED_TRADE_HEADER};
use crate::application::enrichment::TradeEnrichmentService;
use crate::application::product::{LoadSummary, ProductService};
use crate::domain::{Product, ProductId};
use crate::error::Error;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<ProductService>,
    pub enrichment: Arc<TradeEnrichmentService>,
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/trades/enrich", post(enrich_trades_handler))
        .route("/products/:id/name", get(product_name_handler))
        .route("/products/:id", delete(invalidate_handler))
        .route("/products/batch", post(products_batch_handler))
        .route("/products/load", post(load_products_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Message returned by the product-name endpoint for an unknown id.
#[must_use]
pub fn product_not_found_message(id: &ProductId) -> String {
    format!("Product not found for ID: {id}")
}

/// Adapt a request body into a buffered async reader.
fn body_reader(body: Body) -> BufReader<impl tokio::io::AsyncRead + Send + Unpin> {
    let chunks = body.into_data_stream().map_err(std::io::Error::other);
    BufReader::new(StreamReader::new(chunks))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// POST /trades/enrich
///
/// The response streams one CSV line per trade in input order. A failure
/// reading the request body aborts the response stream.
async fn enrich_trades_handler(State(state): State<AppState>, body: Body) -> Response {
    let trades = decode_trades(body_reader(body));
    let enriched = Arc::clone(&state.enrichment)
        .enrich_all(trades)
        .map(|item| item.and_then(|trade| encode_enriched_trade(&trade)));
    let header = stream::once(async { Ok::<_, Error>(format!("{ENRICHED_TRADE_HEADER}\n")) });

    (
        [(header::CONTENT_TYPE, "text/csv")],
        Body::from_stream(header.chain(enriched)),
    )
        .into_response()
}

/// GET /products/:id/name
async fn product_name_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    let id = ProductId::try_new(id).map_err(Error::from)?;
    Ok(match state.products.find_by_id(&id).await {
        Some(product) => product.product_name().to_string(),
        None => product_not_found_message(&id),
    })
}

/// DELETE /products/:id
async fn invalidate_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ProductId::try_new(id).map_err(Error::from)?;
    state.products.cache().invalidate(&id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /products/batch
///
/// A blank id rejects the whole batch.
async fn products_batch_handler(
    State(state): State<AppState>,
    Json(ids): Json<Vec<String>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let ids = ids
        .into_iter()
        .map(ProductId::try_new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)?;
    Ok(Json(state.products.get_by_ids(ids).await))
}

/// POST /products/load
///
/// The body is decoded in full before anything is loaded, so a body that
/// fails mid-read leaves both the cache and the projection untouched.
async fn load_products_handler(
    State(state): State<AppState>,
    body: Body,
) -> Result<Json<LoadSummary>, ApiError> {
    let products: Vec<Product> = decode_products(body_reader(body)).try_collect().await?;

    let summary = state
        .products
        .load_many(stream::iter(products.clone().into_iter().map(Ok)))
        .await?;
    state
        .enrichment
        .load_products(stream::iter(products.into_iter().map(Ok)))
        .await?;

    info!(received = summary.received, "Product batch loaded via API");
    Ok(Json(summary))
}

/// GET /cache/stats
async fn cache_stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.products.cache().stats())
}

// ============================================================================
// Error Handling
// ============================================================================

/// API error types.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    InternalError(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => Self::BadRequest(format!("failed to read request body: {e}")),
            Error::Domain(e) => Self::BadRequest(e.to_string()),
            other => Self::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        warn!(status = %status, error = %message, "Request failed");

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}
