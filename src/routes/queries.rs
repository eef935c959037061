use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::queries::{CreateQueryRequest, QueryList, UpdateQueryStatusRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ContactQuery,
    response::ApiResponse,
    routes::params::QueryListQuery,
    services::query_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_query).get(list_queries))
        .route("/{id}/status", patch(update_query_status))
}

#[utoipa::path(
    post,
    path = "/api/queries",
    request_body = CreateQueryRequest,
    responses(
        (status = 200, description = "Submit contact query", body = ApiResponse<ContactQuery>),
        (status = 400, description = "Missing required fields")
    ),
    tag = "Queries"
)]
pub async fn create_query(
    State(state): State<AppState>,
    Json(payload): Json<CreateQueryRequest>,
) -> AppResult<Json<ApiResponse<ContactQuery>>> {
    let resp = query_service::create_query(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/queries",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "List queries (admin only)", body = ApiResponse<QueryList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Queries"
)]
pub async fn list_queries(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<QueryListQuery>,
) -> AppResult<Json<ApiResponse<QueryList>>> {
    let resp = query_service::list_queries(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/queries/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Query ID")
    ),
    request_body = UpdateQueryStatusRequest,
    responses(
        (status = 200, description = "Update query status (admin only)", body = ApiResponse<ContactQuery>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Queries"
)]
pub async fn update_query_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQueryStatusRequest>,
) -> AppResult<Json<ApiResponse<ContactQuery>>> {
    let resp = query_service::update_query_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
