//! Grid cell lifecycle handlers, nested under the parent search.
//!
//! Status strings parse into the closed [`GridCellStatus`] set before
//! anything touches the database, and cell codes are normalized to the
//! uppercase label scheme so "a1" and "A1" cannot coexist. Transitions are
//! deliberately unrestricted; the one rule enforced here is that an
//! unassigned cell never references a field-search team.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sargrid_core::{labels, GridCellStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    double_option, map_db_error, resolve_search, ApiError, ApiResponse, AppState, ResponseMeta,
};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateGridCellRequest {
    pub cell_code: String,
    pub status: Option<String>,
    pub assigned_field_search_id: Option<i64>,
    pub notes: Option<String>,
}

// Option<Option<T>> is intentional: outer None = "not in request" (keep current),
// Some(None) = "explicitly cleared", Some(Some(v)) = "set to value" (PATCH semantics).
#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdateGridCellRequest {
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_field_search_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GridCellsQuery {
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct GridCellItem {
    pub id: i64,
    pub public_id: Uuid,
    pub search_id: i64,
    pub cell_code: String,
    pub status: GridCellStatus,
    pub assigned_field_search_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn parse_status(rid: &str, value: &str) -> Result<GridCellStatus, ApiError> {
    value
        .parse::<GridCellStatus>()
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))
}

fn parse_cell_code(rid: &str, raw: &str) -> Result<String, ApiError> {
    let code = raw.trim().to_ascii_uppercase();
    if labels::is_valid_cell_code(&code) {
        Ok(code)
    } else {
        Err(ApiError::new(
            rid,
            "validation_error",
            format!("'{raw}' is not a valid cell code; expected column letters and a row number, e.g. \"B3\""),
        ))
    }
}

/// Rows can only hold the four CHECK-constrained strings, so a parse failure
/// here means the schema and the enum have drifted apart.
fn parse_row_status(rid: &str, row: &sargrid_db::GridCellRow) -> Result<GridCellStatus, ApiError> {
    row.status.parse::<GridCellStatus>().map_err(|e| {
        tracing::error!(error = %e, cell_id = row.id, "grid cell row carries an unknown status");
        ApiError::new(rid, "internal_error", "grid cell status could not be read")
    })
}

fn cell_item(rid: &str, row: sargrid_db::GridCellRow) -> Result<GridCellItem, ApiError> {
    let status = parse_row_status(rid, &row)?;
    Ok(GridCellItem {
        id: row.id,
        public_id: row.public_id,
        search_id: row.search_id,
        cell_code: row.cell_code,
        status,
        assigned_field_search_id: row.assigned_field_search_id,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Resolve an assignee, requiring it to belong to the same parent search.
async fn resolve_field_search_for(
    pool: &sqlx::PgPool,
    search_id: i64,
    field_search_id: i64,
    rid: &str,
) -> Result<(), ApiError> {
    let field_search = sargrid_db::get_field_search(pool, field_search_id)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                rid,
                "not_found",
                format!("field search {field_search_id} not found"),
            )
        })?;
    if field_search.search_id != search_id {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("field search {field_search_id} belongs to a different search"),
        ));
    }
    Ok(())
}

fn map_unique_violation(rid: &str, e: &sargrid_db::DbError) -> ApiError {
    if let sargrid_db::DbError::Sqlx(sqlx::Error::Database(db_err)) = e {
        if db_err.code().as_deref() == Some("23505") {
            return ApiError::new(
                rid,
                "conflict",
                "that cell code already exists in this search",
            );
        }
    }
    map_db_error(rid.to_owned(), e)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/searches/:search_id/cells — create a cell.
pub(super) async fn create_grid_cell(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(search_id): Path<i64>,
    Json(body): Json<CreateGridCellRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GridCellItem>>), ApiError> {
    let rid = &req_id.0;
    resolve_search(&state.pool, search_id, rid).await?;

    let cell_code = parse_cell_code(rid, &body.cell_code)?;
    let status = match body.status.as_deref() {
        Some(raw) => parse_status(rid, raw)?,
        None => GridCellStatus::Unassigned,
    };
    if status == GridCellStatus::Unassigned && body.assigned_field_search_id.is_some() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "an unassigned cell cannot reference a field search",
        ));
    }
    if let Some(field_search_id) = body.assigned_field_search_id {
        resolve_field_search_for(&state.pool, search_id, field_search_id, rid).await?;
    }

    let row = sargrid_db::create_grid_cell(
        &state.pool,
        search_id,
        &cell_code,
        status,
        body.assigned_field_search_id,
        body.notes.as_deref(),
    )
    .await
    .map_err(|e| map_unique_violation(rid, &e))?;

    let data = cell_item(rid, row)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/searches/:search_id/cells?status= — ordered by cell code.
pub(super) async fn list_grid_cells(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(search_id): Path<i64>,
    Query(query): Query<GridCellsQuery>,
) -> Result<Json<ApiResponse<Vec<GridCellItem>>>, ApiError> {
    let rid = &req_id.0;
    resolve_search(&state.pool, search_id, rid).await?;

    let status = match query.status.as_deref() {
        Some(raw) => Some(parse_status(rid, raw)?),
        None => None,
    };

    let rows = sargrid_db::list_grid_cells(&state.pool, search_id, status)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| cell_item(rid, row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PATCH /api/v1/searches/:search_id/cells/:cell_id — sparse update of
/// status, assignment, and notes.
pub(super) async fn update_grid_cell(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((search_id, cell_id)): Path<(i64, i64)>,
    Json(body): Json<UpdateGridCellRequest>,
) -> Result<Json<ApiResponse<GridCellItem>>, ApiError> {
    let rid = &req_id.0;

    let current = sargrid_db::get_grid_cell(&state.pool, search_id, cell_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(rid, "not_found", format!("grid cell {cell_id} not found"))
        })?;

    let status = match body.status.as_deref() {
        Some(raw) => Some(parse_status(rid, raw)?),
        None => None,
    };

    // The row must not end up unassigned while still pointing at a team, so
    // check the state it would land in, not just the supplied fields.
    let effective_status = match status {
        Some(s) => s,
        None => parse_row_status(rid, &current)?,
    };
    let effective_assignee = match body.assigned_field_search_id {
        Some(value) => value,
        None => current.assigned_field_search_id,
    };
    if effective_status == GridCellStatus::Unassigned && effective_assignee.is_some() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "an unassigned cell cannot reference a field search; clear assigned_field_search_id in the same update",
        ));
    }
    if let Some(Some(field_search_id)) = body.assigned_field_search_id {
        resolve_field_search_for(&state.pool, search_id, field_search_id, rid).await?;
    }

    let row = sargrid_db::update_grid_cell(
        &state.pool,
        search_id,
        cell_id,
        status,
        body.assigned_field_search_id,
        body.notes.as_ref().map(|opt| opt.as_deref()),
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?
    .ok_or_else(|| ApiError::new(rid, "not_found", format!("grid cell {cell_id} not found")))?;

    let data = cell_item(rid, row)?;
    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/searches/:search_id/cells/:cell_id.
pub(super) async fn delete_grid_cell(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((search_id, cell_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    let deleted = sargrid_db::delete_grid_cell(&state.pool, search_id, cell_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    if deleted == 0 {
        return Err(ApiError::new(
            rid,
            "not_found",
            format!("grid cell {cell_id} not found"),
        ));
    }

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
