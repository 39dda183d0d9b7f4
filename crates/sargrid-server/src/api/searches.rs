//! Search (parent record) handlers: create, list, fetch, grid parameters,
//! delete. The five grid parameters are individually optional so a
//! coordinator can fill them in over several edits; the file endpoint is
//! what finally requires all of them.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sargrid_core::GridParamsError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, resolve_search, ApiError, ApiResponse, AppState, ResponseMeta,
};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateSearchRequest {
    pub subject_surname: String,
    pub notes: Option<String>,
    pub grid_center_lat: Option<f64>,
    pub grid_center_lon: Option<f64>,
    pub grid_cols: Option<i32>,
    pub grid_rows: Option<i32>,
    pub grid_cell_size_m: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateGridParamsRequest {
    pub center_lat: Option<f64>,
    pub center_lon: Option<f64>,
    pub cols: Option<i32>,
    pub rows: Option<i32>,
    pub cell_size_m: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchesQuery {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct SearchItem {
    pub id: i64,
    pub public_id: Uuid,
    pub subject_surname: String,
    pub grid_center_lat: Option<f64>,
    pub grid_center_lon: Option<f64>,
    pub grid_cols: Option<i32>,
    pub grid_rows: Option<i32>,
    pub grid_cell_size_m: Option<f64>,
    pub grid_file_path: Option<String>,
    pub grid_file_generated_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<sargrid_db::SearchRow> for SearchItem {
    fn from(row: sargrid_db::SearchRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            subject_surname: row.subject_surname,
            grid_center_lat: row.grid_center_lat,
            grid_center_lon: row.grid_center_lon,
            grid_cols: row.grid_cols,
            grid_rows: row.grid_rows,
            grid_cell_size_m: row.grid_cell_size_m,
            grid_file_path: row.grid_file_path,
            grid_file_generated_at: row.grid_file_generated_at,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Range-checks whichever grid parameters are present, in the same order
/// and with the same reason strings as full-request validation.
fn validate_grid_params(
    rid: &str,
    center_lat: Option<f64>,
    center_lon: Option<f64>,
    cols: Option<i32>,
    rows: Option<i32>,
    cell_size_m: Option<f64>,
) -> Result<(), ApiError> {
    let reject = |error: GridParamsError| ApiError::new(rid, "validation_error", error.to_string());

    if cols.is_some_and(|v| v < 1) || rows.is_some_and(|v| v < 1) {
        return Err(reject(GridParamsError::EmptyGrid));
    }
    if cell_size_m.is_some_and(|v| !v.is_finite() || v <= 0.0) {
        return Err(reject(GridParamsError::InvalidCellSize));
    }
    if center_lat.is_some_and(|v| !(-90.0..=90.0).contains(&v)) {
        return Err(reject(GridParamsError::LatitudeOutOfRange));
    }
    if center_lon.is_some_and(|v| !(-180.0..=180.0).contains(&v)) {
        return Err(reject(GridParamsError::LongitudeOutOfRange));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/searches — create a parent search record.
pub(super) async fn create_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateSearchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SearchItem>>), ApiError> {
    let rid = &req_id.0;

    let surname = body.subject_surname.trim().to_owned();
    if surname.is_empty() || surname.chars().count() > 200 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "subject surname must be 1–200 characters",
        ));
    }
    validate_grid_params(
        rid,
        body.grid_center_lat,
        body.grid_center_lon,
        body.grid_cols,
        body.grid_rows,
        body.grid_cell_size_m,
    )?;

    let row = sargrid_db::create_search(
        &state.pool,
        &surname,
        body.notes.as_deref(),
        body.grid_center_lat,
        body.grid_center_lon,
        body.grid_cols,
        body.grid_rows,
        body.grid_cell_size_m,
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: SearchItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/searches — newest first.
pub(super) async fn list_searches(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchesQuery>,
) -> Result<Json<ApiResponse<Vec<SearchItem>>>, ApiError> {
    let rows = sargrid_db::list_searches(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(SearchItem::from).collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/searches/:search_id — one search with grid parameters and
/// the artifact reference.
pub(super) async fn get_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(search_id): Path<i64>,
) -> Result<Json<ApiResponse<SearchItem>>, ApiError> {
    let row = resolve_search(&state.pool, search_id, &req_id.0).await?;

    Ok(Json(ApiResponse {
        data: SearchItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PATCH /api/v1/searches/:search_id/grid — set grid parameters (sparse).
pub(super) async fn update_grid_params(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(search_id): Path<i64>,
    Json(body): Json<UpdateGridParamsRequest>,
) -> Result<Json<ApiResponse<SearchItem>>, ApiError> {
    let rid = &req_id.0;
    validate_grid_params(
        rid,
        body.center_lat,
        body.center_lon,
        body.cols,
        body.rows,
        body.cell_size_m,
    )?;

    let row = sargrid_db::update_grid_params(
        &state.pool,
        search_id,
        body.center_lat,
        body.center_lon,
        body.cols,
        body.rows,
        body.cell_size_m,
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?
    .ok_or_else(|| {
        ApiError::new(
            rid,
            "not_found",
            format!("search {search_id} not found"),
        )
    })?;

    Ok(Json(ApiResponse {
        data: SearchItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/searches/:search_id — cells and teams cascade away.
pub(super) async fn delete_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(search_id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    let deleted = sargrid_db::delete_search(&state.pool, search_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    if deleted == 0 {
        return Err(ApiError::new(
            rid,
            "not_found",
            format!("search {search_id} not found"),
        ));
    }

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
