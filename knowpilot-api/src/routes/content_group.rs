//! Content Group Routes
//!
//! Endpoints for the `content_group_{k}` tables, mounted under
//! `/content-group`.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::{
    error::{ApiError, ApiResult},
    services::GroupingService,
    types::{
        CreateTableResponse, FillTableResponse, GenerateQuestionsResponse, GroupSizeQuery,
        SingleQuestionResponse,
    },
};

/// POST /content-group/create-table - Create `content_group_{k}`
#[utoipa::path(
    post,
    path = "/content-group/create-table",
    tag = "Content Group",
    params(GroupSizeQuery),
    responses(
        (status = 200, description = "Table created or already present", body = CreateTableResponse),
        (status = 400, description = "k outside 1..=20", body = ApiError),
    ),
)]
pub async fn create_table(
    State(service): State<GroupingService>,
    Query(params): Query<GroupSizeQuery>,
) -> ApiResult<impl IntoResponse> {
    let response = service.create_table(params.k).await?;
    Ok(Json(response))
}

/// POST /content-group/create-and-fill-table - Create and fill `content_group_{k}`
#[utoipa::path(
    post,
    path = "/content-group/create-and-fill-table",
    tag = "Content Group",
    params(GroupSizeQuery),
    responses(
        (status = 200, description = "Table filled or left as is", body = FillTableResponse),
        (status = 400, description = "k outside 1..=20", body = ApiError),
        (status = 500, description = "Database error", body = ApiError),
    ),
)]
pub async fn create_and_fill_table(
    State(service): State<GroupingService>,
    Query(params): Query<GroupSizeQuery>,
) -> ApiResult<impl IntoResponse> {
    let response = service.fill_table(params.k).await?;
    Ok(Json(response))
}

/// POST /content-group/generate-questions-for-all/{k} - Annotate every row
#[utoipa::path(
    post,
    path = "/content-group/generate-questions-for-all/{k}",
    tag = "Content Group",
    params(
        ("k" = i64, Path, description = "Content columns per row")
    ),
    responses(
        (status = 200, description = "Per-row outcomes", body = GenerateQuestionsResponse),
        (status = 404, description = "Table missing, empty or without content columns", body = ApiError),
    ),
)]
pub async fn generate_questions_for_all(
    State(service): State<GroupingService>,
    Path(k): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let response = service.generate_questions_for_table(k).await?;
    Ok(Json(response))
}

/// POST /content-group/generate-single-choice-question/{k} - Annotate one random row
#[utoipa::path(
    post,
    path = "/content-group/generate-single-choice-question/{k}",
    tag = "Content Group",
    params(
        ("k" = i64, Path, description = "Content columns per row")
    ),
    responses(
        (status = 200, description = "Question stored", body = SingleQuestionResponse),
        (status = 404, description = "Table or eligible row missing", body = ApiError),
        (status = 503, description = "Generation service error", body = ApiError),
    ),
)]
pub async fn generate_single_choice_question(
    State(service): State<GroupingService>,
    Path(k): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let response = service.generate_single_question(k).await?;
    Ok(Json(response))
}

/// GET /content-group/get-data/{k} - All rows of `content_group_{k}`
///
/// Rows are objects keyed by column name, in table column order.
#[utoipa::path(
    get,
    path = "/content-group/get-data/{k}",
    tag = "Content Group",
    params(
        ("k" = i64, Path, description = "Content columns per row")
    ),
    responses(
        (status = 200, description = "Table rows"),
        (status = 404, description = "Table does not exist", body = ApiError),
    ),
)]
pub async fn get_data(
    State(service): State<GroupingService>,
    Path(k): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let rows = service.get_table_data(k).await?;
    Ok(Json(rows))
}

/// Create the content group router.
pub fn create_router(service: GroupingService) -> Router {
    Router::new()
        .route("/create-table", post(create_table))
        .route("/create-and-fill-table", post(create_and_fill_table))
        .route("/generate-questions-for-all/:k", post(generate_questions_for_all))
        .route(
            "/generate-single-choice-question/:k",
            post(generate_single_choice_question),
        )
        .route("/get-data/:k", get(get_data))
        .with_state(service)
}
