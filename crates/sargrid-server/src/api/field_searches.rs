//! Field-search team handlers. A field search is one team sent into the
//! area under a parent search; grid cells are assigned to it by id.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, resolve_search, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct CreateFieldSearchRequest {
    pub search_id: i64,
    pub team_name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct FieldSearchesQuery {
    pub search_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct FieldSearchItem {
    pub id: i64,
    pub public_id: Uuid,
    pub search_id: i64,
    pub team_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<sargrid_db::FieldSearchRow> for FieldSearchItem {
    fn from(row: sargrid_db::FieldSearchRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            search_id: row.search_id,
            team_name: row.team_name,
            created_at: row.created_at,
        }
    }
}

/// POST /api/v1/field-searches — register a team under a parent search.
pub(super) async fn create_field_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateFieldSearchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FieldSearchItem>>), ApiError> {
    let rid = &req_id.0;

    let team_name = body.team_name.trim().to_owned();
    if team_name.is_empty() || team_name.chars().count() > 100 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "team name must be 1–100 characters",
        ));
    }
    resolve_search(&state.pool, body.search_id, rid).await?;

    let row = sargrid_db::create_field_search(&state.pool, body.search_id, &team_name)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: FieldSearchItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/field-searches?search_id= — newest first, optionally scoped
/// to one parent search.
pub(super) async fn list_field_searches(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FieldSearchesQuery>,
) -> Result<Json<ApiResponse<Vec<FieldSearchItem>>>, ApiError> {
    let rows = sargrid_db::list_field_searches(
        &state.pool,
        query.search_id,
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(FieldSearchItem::from).collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
