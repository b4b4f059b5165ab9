//! REST API Routes Module
//!
//! Route handlers grouped by concern:
//! - Content listing, creation and grouping preview
//! - QA and knowledge-point generation
//! - Content group tables and single-choice questions
//! - Health check endpoints (Kubernetes-compatible)
//! - CORS support for the browser client

pub mod content;
pub mod content_group;
pub mod health;
pub mod knowledge;
pub mod qa;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

// ============================================================================
// OPENAPI ENDPOINTS
// ============================================================================

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Handler for /openapi.yaml endpoint.
async fn openapi_yaml() -> impl IntoResponse {
    use axum::http::StatusCode;

    match ApiDoc::to_yaml() {
        Ok(yaml) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/yaml")], yaml),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("Failed to generate YAML: {}", e),
        ),
    }
}

// ============================================================================
// CORS
// ============================================================================

/// Build CORS layer from configuration.
///
/// With no configured origins every origin is allowed. Configured origins may
/// use a `*.` wildcard for subdomains.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        return cors.allow_origin(Any).allow_headers(Any);
    }

    tracing::info!(
        "CORS: Production mode - allowing origins: {:?}",
        config.cors_origins
    );

    let has_wildcard = config.cors_origins.iter().any(|o| o.contains("*."));
    let allow_origin = if has_wildcard {
        let config = config.clone();
        AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| config.is_origin_allowed(o))
                .unwrap_or(false)
        })
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    let cors = cors.allow_origin(allow_origin);
    if config.cors_allow_credentials {
        cors.allow_credentials(true)
    } else {
        cors
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router.
///
/// - Item, QA, knowledge and grouping routes at the root
/// - Content group tables under /content-group/*
/// - Health checks at /health/*
/// - Metrics at /metrics
/// - OpenAPI spec at /openapi.json and /openapi.yaml
/// - Swagger UI at /swagger-ui (when the swagger-ui feature is enabled)
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> Router {
    let router = Router::new()
        .merge(content::create_router(state.enrichment.clone()))
        .merge(qa::create_router(state.enrichment.clone()))
        .merge(knowledge::create_router(state.enrichment.clone()))
        .nest(
            "/content-group",
            content_group::create_router(state.grouping.clone()),
        )
        .nest(
            "/health",
            health::create_router(state.storage.clone(), state.provider.clone()),
        )
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .route("/openapi.yaml", get(openapi_yaml));

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa_swagger_ui::SwaggerUi;
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    };

    let cors = build_cors_layer(api_config);

    router
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
