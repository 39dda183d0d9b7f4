//! Database operations for the `grid_cells` table.
//!
//! Cells are always scoped to their parent search: every read and write
//! filters on `search_id`, so a cell id from one search can never touch
//! another search's grid. Cell status arrives as the closed
//! [`GridCellStatus`] type and is stored as text under a CHECK constraint.

use chrono::{DateTime, Utc};
use sargrid_core::GridCellStatus;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `grid_cells` table. `status` is one of the four lifecycle
/// strings; the CHECK constraint keeps anything else out of the column.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GridCellRow {
    pub id: i64,
    pub public_id: Uuid,
    pub search_id: i64,
    pub cell_code: String,
    pub status: String,
    pub assigned_field_search_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creates a grid cell under a parent search and returns the inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, including the unique
/// violation raised when the cell code already exists in this search.
pub async fn create_grid_cell(
    pool: &PgPool,
    search_id: i64,
    cell_code: &str,
    status: GridCellStatus,
    assigned_field_search_id: Option<i64>,
    notes: Option<&str>,
) -> Result<GridCellRow, DbError> {
    let row = sqlx::query_as::<_, GridCellRow>(
        "INSERT INTO grid_cells (search_id, cell_code, status, assigned_field_search_id, notes) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, public_id, search_id, cell_code, status, assigned_field_search_id, \
                   notes, created_at, updated_at",
    )
    .bind(search_id)
    .bind(cell_code)
    .bind(status.as_str())
    .bind(assigned_field_search_id)
    .bind(notes)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Returns one cell of a search, or `None` if the id does not exist under
/// that parent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_grid_cell(
    pool: &PgPool,
    search_id: i64,
    cell_id: i64,
) -> Result<Option<GridCellRow>, DbError> {
    let row = sqlx::query_as::<_, GridCellRow>(
        "SELECT id, public_id, search_id, cell_code, status, assigned_field_search_id, \
                notes, created_at, updated_at \
         FROM grid_cells \
         WHERE id = $1 AND search_id = $2",
    )
    .bind(cell_id)
    .bind(search_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Returns the cells of a search ordered by cell code, optionally filtered
/// to one status.
///
/// Codes order as plain text, so "A10" sorts before "A2". The ordering only
/// needs to be stable for operators scanning the list; they read codes, not
/// positions.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_grid_cells(
    pool: &PgPool,
    search_id: i64,
    status: Option<GridCellStatus>,
) -> Result<Vec<GridCellRow>, DbError> {
    let rows = sqlx::query_as::<_, GridCellRow>(
        "SELECT id, public_id, search_id, cell_code, status, assigned_field_search_id, \
                notes, created_at, updated_at \
         FROM grid_cells \
         WHERE search_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
         ORDER BY cell_code",
    )
    .bind(search_id)
    .bind(status.map(GridCellStatus::as_str))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Overlays the supplied fields onto an existing cell.
///
/// For the nullable columns the outer `Option` means "was supplied":
/// `None` keeps the existing value, `Some(None)` clears it, `Some(value)`
/// sets it. Status cannot be cleared, only replaced.
///
/// Returns `None` if the cell does not exist under that parent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_grid_cell(
    pool: &PgPool,
    search_id: i64,
    cell_id: i64,
    status: Option<GridCellStatus>,
    assigned_field_search_id: Option<Option<i64>>,
    notes: Option<Option<&str>>,
) -> Result<Option<GridCellRow>, DbError> {
    let assigned_supplied = assigned_field_search_id.is_some();
    let assigned_val = assigned_field_search_id.flatten();
    let notes_supplied = notes.is_some();
    let notes_val = notes.flatten();

    let row = sqlx::query_as::<_, GridCellRow>(
        "UPDATE grid_cells \
         SET status                   = COALESCE($3, status), \
             assigned_field_search_id = CASE WHEN $4::BOOL THEN $5 ELSE assigned_field_search_id END, \
             notes                    = CASE WHEN $6::BOOL THEN $7 ELSE notes END, \
             updated_at               = NOW() \
         WHERE id = $1 AND search_id = $2 \
         RETURNING id, public_id, search_id, cell_code, status, assigned_field_search_id, \
                   notes, created_at, updated_at",
    )
    .bind(cell_id)
    .bind(search_id)
    .bind(status.map(GridCellStatus::as_str))
    .bind(assigned_supplied)
    .bind(assigned_val)
    .bind(notes_supplied)
    .bind(notes_val)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Deletes one cell of a search.
///
/// Returns the number of rows deleted (0 if the cell did not exist under
/// that parent).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_grid_cell(
    pool: &PgPool,
    search_id: i64,
    cell_id: i64,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM grid_cells WHERE id = $1 AND search_id = $2")
        .bind(cell_id)
        .bind(search_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
