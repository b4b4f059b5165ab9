//! Question/Answer Generation Routes

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use knowpilot_core::{EnrichmentKind, ItemId};

use crate::{
    error::{ApiError, ApiResult},
    services::{BulkOptions, EnrichmentService},
    types::{BulkEnrichResponse, EnrichSingleResponse},
};

/// GET /generate-qa-single/{id} - Generate a question and answer for one item
#[utoipa::path(
    get,
    path = "/generate-qa-single/{id}",
    tag = "QA",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item updated", body = EnrichSingleResponse),
        (status = 404, description = "Item not found", body = ApiError),
        (status = 500, description = "Generated text could not be parsed", body = ApiError),
        (status = 503, description = "Generation service error", body = ApiError),
    ),
)]
pub async fn generate_qa_single(
    State(service): State<EnrichmentService>,
    Path(id): Path<ItemId>,
) -> ApiResult<impl IntoResponse> {
    let item = service.enrich_one(id, EnrichmentKind::Qa).await?;
    Ok(Json(EnrichSingleResponse::new(item)))
}

/// POST /generate-all - Generate questions and answers for every item without one
#[utoipa::path(
    post,
    path = "/generate-all",
    tag = "QA",
    responses(
        (status = 200, description = "Bulk run finished", body = BulkEnrichResponse),
        (status = 500, description = "Batch commit failed", body = ApiError),
    ),
)]
pub async fn generate_qa_all(
    State(service): State<EnrichmentService>,
) -> ApiResult<impl IntoResponse> {
    let result = service
        .enrich_all(EnrichmentKind::Qa, BulkOptions::default())
        .await?;
    Ok(Json(BulkEnrichResponse::from(result)))
}

/// Create the QA router. The bulk run is reachable with GET and POST.
pub fn create_router(service: EnrichmentService) -> Router {
    Router::new()
        .route("/generate-qa-single/:id", get(generate_qa_single))
        .route("/generate-all", post(generate_qa_all))
        .route("/generate-qa-all", get(generate_qa_all))
        .with_state(service)
}
