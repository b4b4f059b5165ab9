//! Knowledge Point Routes
//!
//! Generation, listing and reset of item knowledge points.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use knowpilot_core::{EnrichmentKind, ItemId};

use crate::{
    error::{ApiError, ApiResult},
    services::{BulkOptions, EnrichmentService},
    types::{
        BulkEnrichResponse, BulkOptionsQuery, ClearKnowledgeResponse, EnrichSingleResponse,
        KnowledgeEntry,
    },
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /generate-knowledge-single/{id} - Generate a knowledge point for one item
#[utoipa::path(
    get,
    path = "/generate-knowledge-single/{id}",
    tag = "Knowledge",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item updated", body = EnrichSingleResponse),
        (status = 404, description = "Item not found", body = ApiError),
        (status = 500, description = "Generated text was empty", body = ApiError),
        (status = 503, description = "Generation service error", body = ApiError),
    ),
)]
pub async fn generate_knowledge_single(
    State(service): State<EnrichmentService>,
    Path(id): Path<ItemId>,
) -> ApiResult<impl IntoResponse> {
    let item = service.enrich_one(id, EnrichmentKind::KnowledgePoint).await?;
    Ok(Json(EnrichSingleResponse::with_knowledge_point(item)))
}

/// GET /generate-knowledge-all - Generate knowledge points for every item
#[utoipa::path(
    get,
    path = "/generate-knowledge-all",
    tag = "Knowledge",
    params(BulkOptionsQuery),
    responses(
        (status = 200, description = "Bulk run finished", body = BulkEnrichResponse),
        (status = 500, description = "Batch commit failed", body = ApiError),
    ),
)]
pub async fn generate_knowledge_all(
    State(service): State<EnrichmentService>,
    Query(params): Query<BulkOptionsQuery>,
) -> ApiResult<impl IntoResponse> {
    let options = BulkOptions {
        skip_existing: params.skip_existing,
    };
    let result = service
        .enrich_all(EnrichmentKind::KnowledgePoint, options)
        .await?;
    Ok(Json(BulkEnrichResponse::from(result)))
}

/// GET /knowledge/get-all - List the knowledge point of every item
#[utoipa::path(
    get,
    path = "/knowledge/get-all",
    tag = "Knowledge",
    responses(
        (status = 200, description = "Knowledge points", body = [KnowledgeEntry]),
    ),
)]
pub async fn list_knowledge(
    State(service): State<EnrichmentService>,
) -> ApiResult<impl IntoResponse> {
    let entries = service.list_knowledge().await?;
    Ok(Json(entries))
}

/// POST /knowledge/clear-all - Reset every knowledge point
#[utoipa::path(
    post,
    path = "/knowledge/clear-all",
    tag = "Knowledge",
    responses(
        (status = 200, description = "Knowledge points cleared", body = ClearKnowledgeResponse),
    ),
)]
pub async fn clear_knowledge(
    State(service): State<EnrichmentService>,
) -> ApiResult<impl IntoResponse> {
    let cleared_count = service.clear_knowledge().await?;
    Ok(Json(ClearKnowledgeResponse {
        status: "success".to_string(),
        cleared_count,
    }))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the knowledge router. `POST /knowledge/generate-all` is the
/// bulk run under the path the web client uses.
pub fn create_router(service: EnrichmentService) -> Router {
    Router::new()
        .route("/generate-knowledge-single/:id", get(generate_knowledge_single))
        .route("/generate-knowledge-all", get(generate_knowledge_all))
        .route("/knowledge/generate-all", post(generate_knowledge_all))
        .route("/knowledge/get-all", get(list_knowledge))
        .route("/knowledge/clear-all", post(clear_knowledge))
        .with_state(service)
}
