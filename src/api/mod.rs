//! API Layer - REST endpoints for ask-the-database, health and dashboard aggregates

pub mod dashboard;

use crate::config::AppConfig;
use crate::db::SqlExecutor;
use crate::schema::{SCHEMA_TEXT, TABLE_NAMES};
use crate::service::{QueryRequest, QueryResponse, QueryService};
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the main API router.
pub fn router(
    service: Arc<QueryService>,
    executor: Arc<dyn SqlExecutor>,
    config: Arc<AppConfig>,
) -> Router {
    let cors = cors_layer(&config);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/query", post(query_handler))
        .route("/chat-with-data", post(chat_with_data_handler))
        .route("/schema", get(schema_handler))
        // Dashboard aggregates
        .merge(dashboard::routes())
        .fallback(not_found_handler)
        // Global Extensions
        .layer(Extension(service))
        .layer(Extension(executor))
        .layer(Extension(config))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Production narrows origins to the configured allow-list; every other
/// environment accepts any origin and logs a warning.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.is_production() {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        warn!(environment = %config.environment, "CORS open to all origins");
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    }
}

async fn index_handler() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /query": "answer a natural language question with SQL",
            "POST /chat-with-data": "frontend alias for /query",
            "GET /health": "database and Groq key status",
            "GET /schema": "schema text handed to the model",
            "GET /stats": "overview statistics",
            "GET /invoices": "paginated invoice list",
            "GET /invoices/:id": "single invoice with line items and payments",
            "GET /vendors/top10": "top vendors by spend",
            "GET /invoice-trends": "monthly totals for the current year",
            "GET /category-spend": "spend grouped by category",
            "GET /cash-outflow": "upcoming outflow by due date bucket"
        }
    }))
}

/// Probes the database with a throwaway statement. Always HTTP 200; the body
/// says whether anything is wrong.
async fn health_handler(
    Extension(executor): Extension<Arc<dyn SqlExecutor>>,
    Extension(config): Extension<Arc<AppConfig>>,
) -> Json<Value> {
    match executor.execute("SELECT 1").await {
        Ok(_) => {
            let key = if config.groq.api_key.is_some() { "configured" } else { "missing" };
            Json(json!({
                "status": "healthy",
                "database": "connected",
                "groq_api_key": key
            }))
        }
        Err(e) => Json(json!({ "status": "unhealthy", "error": e.to_string() })),
    }
}

async fn query_handler(
    Extension(service): Extension<Arc<QueryService>>,
    Json(req): Json<QueryRequest>,
) -> Json<QueryResponse> {
    Json(service.handle(&req.question).await)
}

#[derive(serde::Deserialize)]
struct ChatRequest {
    #[serde(default)]
    query: String,
}

/// Frontend-facing alias for `/query`. Takes `{query}` instead of
/// `{question}` and folds the pipeline error into `explanation`.
async fn chat_with_data_handler(
    Extension(service): Extension<Arc<QueryService>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if req.query.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Query is required" }))));
    }
    let resp = service.handle(&req.query).await;
    Ok(Json(json!({
        "query": req.query,
        "sql": resp.sql,
        "results": resp.results,
        "explanation": resp.error.unwrap_or_default()
    })))
}

async fn schema_handler() -> Json<Value> {
    Json(json!({ "schema": SCHEMA_TEXT, "tables": TABLE_NAMES }))
}

async fn not_found_handler() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "route not found" })))
}
