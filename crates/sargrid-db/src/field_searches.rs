//! Database operations for the `field_searches` table.
//!
//! A field search is one team sent into the area for a parent search. Grid
//! cells reference it through `assigned_field_search_id`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `field_searches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FieldSearchRow {
    pub id: i64,
    pub public_id: Uuid,
    pub search_id: i64,
    pub team_name: String,
    pub created_at: DateTime<Utc>,
}

/// Creates a field-search team under a parent search and returns the
/// inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails (including a missing parent,
/// which surfaces as a foreign key violation).
pub async fn create_field_search(
    pool: &PgPool,
    search_id: i64,
    team_name: &str,
) -> Result<FieldSearchRow, DbError> {
    let row = sqlx::query_as::<_, FieldSearchRow>(
        "INSERT INTO field_searches (search_id, team_name) \
         VALUES ($1, $2) \
         RETURNING id, public_id, search_id, team_name, created_at",
    )
    .bind(search_id)
    .bind(team_name)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Returns a single field search by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_field_search(
    pool: &PgPool,
    field_search_id: i64,
) -> Result<Option<FieldSearchRow>, DbError> {
    let row = sqlx::query_as::<_, FieldSearchRow>(
        "SELECT id, public_id, search_id, team_name, created_at \
         FROM field_searches \
         WHERE id = $1",
    )
    .bind(field_search_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Returns field searches, newest first, optionally filtered to one parent
/// search.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_field_searches(
    pool: &PgPool,
    search_id: Option<i64>,
    limit: i64,
) -> Result<Vec<FieldSearchRow>, DbError> {
    let rows = sqlx::query_as::<_, FieldSearchRow>(
        "SELECT id, public_id, search_id, team_name, created_at \
         FROM field_searches \
         WHERE ($1::BIGINT IS NULL OR search_id = $1) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(search_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
