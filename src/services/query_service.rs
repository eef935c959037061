use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::queries::{CreateQueryRequest, QueryList, UpdateQueryStatusRequest},
    entity::queries::{ActiveModel as QueryActive, Column as QueryCol, Entity as Queries, Model as QueryModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::ContactQuery,
    response::{ApiResponse, Meta},
    routes::params::QueryListQuery,
    state::AppState,
};

pub const QUERY_STATUSES: [&str; 3] = ["pending", "in process", "resolved"];

/// Public contact-form submission.
pub async fn create_query(
    state: &AppState,
    payload: CreateQueryRequest,
) -> AppResult<ApiResponse<ContactQuery>> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.message.trim().is_empty()
    {
        return Err(AppError::BadRequest(
            "name, email and message are required".into(),
        ));
    }

    let query = QueryActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        email: Set(payload.email),
        phone: Set(payload.phone),
        message: Set(payload.message),
        status: Set("pending".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "query_create",
        Some("queries"),
        Some(serde_json::json!({ "query_id": query.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Query submitted",
        query_from_entity(query),
        Some(Meta::empty()),
    ))
}

pub async fn list_queries(
    state: &AppState,
    user: &AuthUser,
    query: QueryListQuery,
) -> AppResult<ApiResponse<QueryList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(QueryCol::Status.eq(status.clone()));
    }

    let finder = Queries::find()
        .filter(condition)
        .order_by_desc(QueryCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(query_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Queries", QueryList { items }, Some(meta)))
}

pub async fn update_query_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateQueryStatusRequest,
) -> AppResult<ApiResponse<ContactQuery>> {
    ensure_admin(user)?;
    validate_query_status(&payload.status)?;

    let existing = Queries::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(q) => q,
        None => return Err(AppError::NotFound),
    };

    let mut active: QueryActive = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let query = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "query_status_update",
        Some("queries"),
        Some(serde_json::json!({ "query_id": query.id, "status": query.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Query updated",
        query_from_entity(query),
        Some(Meta::empty()),
    ))
}

pub fn validate_query_status(status: &str) -> Result<(), AppError> {
    if QUERY_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid query status".into()))
    }
}

fn query_from_entity(model: QueryModel) -> ContactQuery {
    ContactQuery {
        id: model.id,
        name: model.name,
        email: model.email,
        phone: model.phone,
        message: model.message,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_set_is_closed() {
        for s in QUERY_STATUSES {
            assert!(validate_query_status(s).is_ok());
        }
        assert!(validate_query_status("done").is_err());
    }
}
