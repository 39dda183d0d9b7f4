//! Database operations for the `searches` table.
//!
//! A search is the parent record for one missing-person operation. It owns
//! the grid parameters, the generated grid-file reference, and (through
//! foreign keys) the field-search teams and grid cells.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `searches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchRow {
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

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Creates a new search and returns the full inserted row. Grid parameters
/// are optional at creation and may be filled in later.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
#[allow(clippy::too_many_arguments)] // public API for full search creation; no sensible grouping
pub async fn create_search(
    pool: &PgPool,
    subject_surname: &str,
    notes: Option<&str>,
    grid_center_lat: Option<f64>,
    grid_center_lon: Option<f64>,
    grid_cols: Option<i32>,
    grid_rows: Option<i32>,
    grid_cell_size_m: Option<f64>,
) -> Result<SearchRow, DbError> {
    let row = sqlx::query_as::<_, SearchRow>(
        "INSERT INTO searches \
           (subject_surname, notes, grid_center_lat, grid_center_lon, grid_cols, grid_rows, \
            grid_cell_size_m) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, public_id, subject_surname, grid_center_lat, grid_center_lon, grid_cols, \
                   grid_rows, grid_cell_size_m, grid_file_path, grid_file_generated_at, notes, \
                   created_at, updated_at",
    )
    .bind(subject_surname)
    .bind(notes)
    .bind(grid_center_lat)
    .bind(grid_center_lon)
    .bind(grid_cols)
    .bind(grid_rows)
    .bind(grid_cell_size_m)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Returns a single search by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_search(pool: &PgPool, search_id: i64) -> Result<Option<SearchRow>, DbError> {
    let row = sqlx::query_as::<_, SearchRow>(
        "SELECT id, public_id, subject_surname, grid_center_lat, grid_center_lon, grid_cols, \
                grid_rows, grid_cell_size_m, grid_file_path, grid_file_generated_at, notes, \
                created_at, updated_at \
         FROM searches \
         WHERE id = $1",
    )
    .bind(search_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Returns the most recently created searches, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_searches(pool: &PgPool, limit: i64) -> Result<Vec<SearchRow>, DbError> {
    let rows = sqlx::query_as::<_, SearchRow>(
        "SELECT id, public_id, subject_surname, grid_center_lat, grid_center_lon, grid_cols, \
                grid_rows, grid_cell_size_m, grid_file_path, grid_file_generated_at, notes, \
                created_at, updated_at \
         FROM searches \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Overlays the supplied grid parameters onto an existing search: `Some(v)`
/// sets the value, `None` preserves the existing one. A single
/// `UPDATE ... RETURNING` keeps the overlay atomic.
///
/// Returns `None` if the search does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_grid_params(
    pool: &PgPool,
    search_id: i64,
    grid_center_lat: Option<f64>,
    grid_center_lon: Option<f64>,
    grid_cols: Option<i32>,
    grid_rows: Option<i32>,
    grid_cell_size_m: Option<f64>,
) -> Result<Option<SearchRow>, DbError> {
    let row = sqlx::query_as::<_, SearchRow>(
        "UPDATE searches \
         SET grid_center_lat  = COALESCE($2, grid_center_lat), \
             grid_center_lon  = COALESCE($3, grid_center_lon), \
             grid_cols        = COALESCE($4, grid_cols), \
             grid_rows        = COALESCE($5, grid_rows), \
             grid_cell_size_m = COALESCE($6, grid_cell_size_m), \
             updated_at       = NOW() \
         WHERE id = $1 \
         RETURNING id, public_id, subject_surname, grid_center_lat, grid_center_lon, grid_cols, \
                   grid_rows, grid_cell_size_m, grid_file_path, grid_file_generated_at, notes, \
                   created_at, updated_at",
    )
    .bind(search_id)
    .bind(grid_center_lat)
    .bind(grid_center_lon)
    .bind(grid_cols)
    .bind(grid_rows)
    .bind(grid_cell_size_m)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Points a search at its freshly generated grid file. Repeat generations
/// overwrite the reference; last writer wins. The statement is atomic, so a
/// crash either leaves the old reference or stores the new one, never half.
///
/// Returns the number of rows updated (0 if the search vanished).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_grid_artifact(
    pool: &PgPool,
    search_id: i64,
    file_path: &str,
    generated_at: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE searches \
         SET grid_file_path = $2, grid_file_generated_at = $3, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(search_id)
    .bind(file_path)
    .bind(generated_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Deletes a search. Grid cells and field-search teams cascade away with it.
///
/// Returns the number of rows deleted (0 if the search did not exist).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_search(pool: &PgPool, search_id: i64) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM searches WHERE id = $1")
        .bind(search_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
