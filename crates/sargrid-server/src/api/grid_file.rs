//! Grid file generation and delivery.
//!
//! `POST /api/v1/searches/:search_id/grid/file` reads the grid parameters
//! stored on the search, computes the layout, renders the GPX document,
//! stores it under the storage root, points the search at the stored file,
//! and hands the document straight back as a download. If the reference
//! cannot be recorded, a file created by this write is removed again, while
//! a rewrite of an already-published name is left in place so the path
//! recorded by the earlier generation still resolves.

use axum::{
    extract::{Path, State},
    http::header,
    Extension,
};
use chrono::Utc;
use sargrid_core::{gpx, grid, translit, GridRequest};

use crate::middleware::RequestId;
use crate::storage::GridStore;

use super::{map_db_error, resolve_search, ApiError, AppState};

/// Reason string returned when any of the five grid parameters is missing.
pub(super) const INCOMPLETE_PARAMS: &str = "grid parameters are incomplete: set center latitude, center longitude, columns, rows, and cell size";

/// POST /api/v1/searches/:search_id/grid/file — generate and download.
pub(super) async fn generate_grid_file(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(search_id): Path<i64>,
) -> Result<([(header::HeaderName, String); 2], String), ApiError> {
    let rid = &req_id.0;
    let search = resolve_search(&state.pool, search_id, rid).await?;

    let request = grid_request_from_search(rid, &search)?;
    let layout = grid::layout(&request);

    let generated_at = Utc::now();
    let filename = translit::grid_filename(&search.subject_surname, generated_at.date_naive());
    let document = gpx::encode(&layout, generated_at, &state.gpx_creator).map_err(|e| {
        tracing::error!(error = %e, search_id, "GPX encoding failed");
        ApiError::new(rid, "internal_error", "failed to render the grid document")
    })?;

    let stored = state
        .storage
        .store_grid_file(&filename, document.as_bytes())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, search_id, filename = %filename, "failed to store grid file");
            ApiError::new(
                rid,
                "service_unavailable",
                "could not store the grid file; try again",
            )
        })?;

    let public_path = GridStore::public_path(&filename);
    match sargrid_db::update_grid_artifact(&state.pool, search_id, &public_path, generated_at).await
    {
        Ok(rows) if rows > 0 => {}
        Ok(_) => {
            // The search vanished between resolve and update.
            roll_back_grid_file(&state.storage, &filename, stored.replaced).await;
            return Err(ApiError::new(
                rid,
                "not_found",
                format!("search {search_id} not found"),
            ));
        }
        Err(e) => {
            roll_back_grid_file(&state.storage, &filename, stored.replaced).await;
            return Err(map_db_error(rid.clone(), &e));
        }
    }

    Ok((
        [
            (header::CONTENT_TYPE, gpx::GPX_MEDIA_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        document,
    ))
}

/// Builds a validated [`GridRequest`] from the five stored parameters.
/// All five must be present; range failures reuse the core reason strings
/// so the API reports the same message an offline run would.
fn grid_request_from_search(
    rid: &str,
    search: &sargrid_db::SearchRow,
) -> Result<GridRequest, ApiError> {
    let (Some(center_lat), Some(center_lon), Some(cols), Some(rows), Some(cell_size_m)) = (
        search.grid_center_lat,
        search.grid_center_lon,
        search.grid_cols,
        search.grid_rows,
        search.grid_cell_size_m,
    ) else {
        return Err(ApiError::new(rid, "validation_error", INCOMPLETE_PARAMS));
    };

    // Negative stored dimensions collapse to 0 and fail the empty-grid check.
    let cols = u32::try_from(cols).unwrap_or(0);
    let rows = u32::try_from(rows).unwrap_or(0);

    GridRequest::new(center_lat, center_lon, cols, rows, cell_size_m)
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))
}

/// Best-effort rollback of a stored file after a failed reference update.
/// A write that replaced an already-published artifact stays on disk: the
/// search still holds the earlier generation's path, and that path must
/// keep resolving to a readable document.
pub(super) async fn roll_back_grid_file(storage: &GridStore, filename: &str, replaced: bool) {
    if replaced {
        return;
    }
    if let Err(e) = storage.remove_grid_file(filename).await {
        tracing::warn!(error = %e, filename = %filename, "rollback of stored grid file failed");
    }
}
