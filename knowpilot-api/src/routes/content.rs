//! Content REST API Routes
//!
//! Item listing, creation and lookup, plus the in-memory grouping preview.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use knowpilot_core::{Item, ItemId, NewItem};

use crate::{
    error::{ApiError, ApiResult},
    services::EnrichmentService,
    types::{FactGroup, GroupPreviewQuery},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /all_contents - List every item in insertion order
#[utoipa::path(
    get,
    path = "/all_contents",
    tag = "Content",
    responses(
        (status = 200, description = "All items", body = [Item]),
        (status = 500, description = "Database error", body = ApiError),
    ),
)]
pub async fn list_contents(
    State(service): State<EnrichmentService>,
) -> ApiResult<impl IntoResponse> {
    let items = service.list_items().await?;
    Ok(Json(items))
}

/// POST /contents - Create a new item
#[utoipa::path(
    post,
    path = "/contents",
    tag = "Content",
    request_body = NewItem,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Invalid content", body = ApiError),
    ),
)]
pub async fn create_content(
    State(service): State<EnrichmentService>,
    Json(req): Json<NewItem>,
) -> ApiResult<impl IntoResponse> {
    let item = service.create_item(req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /contents/{id} - Get one item
#[utoipa::path(
    get,
    path = "/contents/{id}",
    tag = "Content",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item found", body = Item),
        (status = 404, description = "Item not found", body = ApiError),
    ),
)]
pub async fn get_content(
    State(service): State<EnrichmentService>,
    Path(id): Path<ItemId>,
) -> ApiResult<impl IntoResponse> {
    let item = service.get_item(id).await?;
    Ok(Json(item))
}

/// GET /facts/grouped - Preview items in consecutive groups of `num`
#[utoipa::path(
    get,
    path = "/facts/grouped",
    tag = "Content",
    params(GroupPreviewQuery),
    responses(
        (status = 200, description = "Grouped items", body = [FactGroup]),
        (status = 400, description = "Group size is not positive", body = ApiError),
    ),
)]
pub async fn grouped_facts(
    State(service): State<EnrichmentService>,
    Query(params): Query<GroupPreviewQuery>,
) -> ApiResult<impl IntoResponse> {
    let groups = service.group_preview(params.num).await?;
    Ok(Json(groups))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the content router.
pub fn create_router(service: EnrichmentService) -> Router {
    Router::new()
        .route("/all_contents", get(list_contents))
        .route("/contents", post(create_content))
        .route("/contents/:id", get(get_content))
        .route("/facts/grouped", get(grouped_facts))
        .with_state(service)
}
