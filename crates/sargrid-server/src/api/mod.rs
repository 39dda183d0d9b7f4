mod field_searches;
mod grid_cells;
mod grid_file;
mod searches;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};
use crate::storage::GridStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub storage: GridStore,
    pub gpx_creator: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &sargrid_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Deserializes a PATCH field so "absent" (outer `None`) stays distinct from
/// "present but null" (`Some(None)`); plain serde folds both into `None`.
pub(super) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Resolve a search id to its row, returning 404 if not found.
async fn resolve_search(
    pool: &PgPool,
    search_id: i64,
    request_id: &str,
) -> Result<sargrid_db::SearchRow, ApiError> {
    sargrid_db::get_search(pool, search_id)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                request_id,
                "not_found",
                format!("search {search_id} not found"),
            )
        })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(
    storage: &GridStore,
    auth: AuthState,
    rate_limit: RateLimitState,
) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/searches",
            get(searches::list_searches).post(searches::create_search),
        )
        .route(
            "/api/v1/searches/{search_id}",
            get(searches::get_search).delete(searches::delete_search),
        )
        .route(
            "/api/v1/searches/{search_id}/grid",
            patch(searches::update_grid_params),
        )
        .route(
            "/api/v1/searches/{search_id}/grid/file",
            post(grid_file::generate_grid_file),
        )
        .route(
            "/api/v1/field-searches",
            get(field_searches::list_field_searches).post(field_searches::create_field_search),
        )
        .route(
            "/api/v1/searches/{search_id}/cells",
            get(grid_cells::list_grid_cells).post(grid_cells::create_grid_cell),
        )
        .route(
            "/api/v1/searches/{search_id}/cells/{cell_id}",
            patch(grid_cells::update_grid_cell).delete(grid_cells::delete_grid_cell),
        )
        .nest_service("/files", ServeDir::new(storage.root()))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));
    let protected = protected_router(&state.storage, auth, rate_limit);

    Router::new()
        .merge(public_routes)
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match sargrid_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde::Deserialize;
    use std::time::Duration;
    use tower::ServiceExt;

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn api_error_status_mapping_covers_every_code() {
        let cases = [
            ("not_found", StatusCode::NOT_FOUND),
            ("unauthorized", StatusCode::UNAUTHORIZED),
            ("validation_error", StatusCode::BAD_REQUEST),
            ("conflict", StatusCode::CONFLICT),
            ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
            ("service_unavailable", StatusCode::SERVICE_UNAVAILABLE),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, expected) in cases {
            let response = ApiError::new("req-1", code, "boom").into_response();
            assert_eq!(response.status(), expected, "{code}");
        }
    }

    #[test]
    fn double_option_distinguishes_missing_from_null() {
        #[derive(Debug, Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "double_option")]
            value: Option<Option<i64>>,
        }

        let missing: Patch = serde_json::from_str("{}").expect("missing field");
        assert_eq!(missing.value, None);
        let null: Patch = serde_json::from_str(r#"{"value":null}"#).expect("null field");
        assert_eq!(null.value, Some(None));
        let set: Patch = serde_json::from_str(r#"{"value":7}"#).expect("set field");
        assert_eq!(set.value, Some(Some(7)));
    }

    #[tokio::test]
    async fn failed_regeneration_keeps_a_previously_published_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GridStore::new(dir.path());
        let name = "petrenko_2025-08-10.gpx";

        // Rolling back a first-ever write removes the file again.
        let fresh = store
            .store_grid_file(name, b"<gpx first/>")
            .await
            .expect("first write");
        assert!(!fresh.replaced);
        grid_file::roll_back_grid_file(&store, name, fresh.replaced).await;
        assert!(!fresh.path.exists());

        // Same surname, same day: the rewrite replaces the published file,
        // so a failed reference update must leave it on disk for the path
        // already recorded on the search.
        let published = store
            .store_grid_file(name, b"<gpx first/>")
            .await
            .expect("republish");
        let rewrite = store
            .store_grid_file(name, b"<gpx second/>")
            .await
            .expect("rewrite");
        assert!(rewrite.replaced);
        grid_file::roll_back_grid_file(&store, name, rewrite.replaced).await;
        assert!(
            published.path.exists(),
            "published artifact must survive a failed regeneration"
        );
    }

    // -------------------------------------------------------------------------
    // Route integration tests (with DB)
    // -------------------------------------------------------------------------

    fn test_app(pool: sqlx::PgPool) -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let auth = crate::middleware::AuthState::from_env(true).expect("auth");
        let state = AppState {
            pool,
            storage: GridStore::new(dir.path()),
            gpx_creator: "sargrid-tests".to_string(),
        };
        let app = build_app(state, auth, RateLimitState::new(120, Duration::from_secs(60)));
        (app, dir)
    }

    /// Seed a search with full grid parameters through the db layer.
    async fn seed_search(pool: &sqlx::PgPool) -> i64 {
        sargrid_db::create_search(
            pool,
            "Шевченко",
            None,
            Some(50.45),
            Some(30.52),
            Some(3),
            Some(2),
            Some(500.0),
        )
        .await
        .expect("seed search")
        .id
    }

    async fn seed_team(pool: &sqlx::PgPool, search_id: i64, name: &str) -> i64 {
        sargrid_db::create_field_search(pool, search_id, name)
            .await
            .expect("seed field search")
            .id
    }

    async fn request(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json parse")
        };
        (status, json)
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_database_ok(pool: sqlx::PgPool) {
        let (app, _store_dir) = test_app(pool);

        let (status, json) = request(&app, Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"].as_str(), Some("ok"));
        assert_eq!(json["data"]["database"].as_str(), Some("ok"));
        assert!(json["meta"]["request_id"]
            .as_str()
            .is_some_and(|id| !id.is_empty()));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_search_returns_the_created_row(pool: sqlx::PgPool) {
        let (app, _store_dir) = test_app(pool);

        let (status, json) = request(
            &app,
            Method::POST,
            "/api/v1/searches",
            Some(serde_json::json!({
                "subject_surname": "Шевченко",
                "grid_center_lat": 50.45,
                "grid_center_lon": 30.52,
                "grid_cols": 3,
                "grid_rows": 2,
                "grid_cell_size_m": 500.0,
                "notes": "sector north of the river"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["subject_surname"].as_str(), Some("Шевченко"));
        assert_eq!(json["data"]["grid_cols"].as_i64(), Some(3));
        assert!(json["data"]["grid_file_path"].is_null());
        assert!(json["data"]["public_id"].is_string());
        let id = json["data"]["id"].as_i64().expect("search id");

        let (status, json) =
            request(&app, Method::GET, &format!("/api/v1/searches/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["grid_cell_size_m"].as_f64(), Some(500.0));

        let (status, json) = request(&app, Method::GET, "/api/v1/searches?limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().map(Vec::len), Some(1));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_search_rejects_bad_input(pool: sqlx::PgPool) {
        let (app, _store_dir) = test_app(pool);

        let (status, json) = request(
            &app,
            Method::POST,
            "/api/v1/searches",
            Some(serde_json::json!({ "subject_surname": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));

        let (status, json) = request(
            &app,
            Method::POST,
            "/api/v1/searches",
            Some(serde_json::json!({ "subject_surname": "Коваль", "grid_center_lat": 91.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"]["message"].as_str(),
            Some("latitude must be between -90 and 90 degrees")
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_search_returns_404_for_unknown_id(pool: sqlx::PgPool) {
        let (app, _store_dir) = test_app(pool);

        let (status, json) = request(&app, Method::GET, "/api/v1/searches/999999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"].as_str(), Some("not_found"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn update_grid_params_overlays_only_supplied_fields(pool: sqlx::PgPool) {
        let search_id = seed_search(&pool).await;
        let (app, _store_dir) = test_app(pool);
        let uri = format!("/api/v1/searches/{search_id}/grid");

        let (status, json) = request(
            &app,
            Method::PATCH,
            &uri,
            Some(serde_json::json!({ "cols": 8 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["grid_cols"].as_i64(), Some(8));
        assert_eq!(json["data"]["grid_center_lat"].as_f64(), Some(50.45));

        let (status, json) = request(
            &app,
            Method::PATCH,
            &uri,
            Some(serde_json::json!({ "cell_size_m": 0.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"]["message"].as_str(),
            Some("cell size must be greater than 0 meters")
        );

        let (status, _) = request(
            &app,
            Method::PATCH,
            "/api/v1/searches/999999/grid",
            Some(serde_json::json!({ "cols": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn delete_search_returns_404_once_gone(pool: sqlx::PgPool) {
        let search_id = seed_search(&pool).await;
        let (app, _store_dir) = test_app(pool);
        let uri = format!("/api/v1/searches/{search_id}");

        let (status, json) = request(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["deleted"].as_bool(), Some(true));

        let (status, _) = request(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = request(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn generate_grid_file_streams_gpx_and_records_the_artifact(pool: sqlx::PgPool) {
        let search_id = seed_search(&pool).await;
        let (app, _store_dir) = test_app(pool);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(format!("/api/v1/searches/{search_id}/grid/file"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/gpx+xml")
        );
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .expect("content disposition");
        assert!(disposition.contains("Shevchenko_"), "{disposition}");
        assert!(disposition.ends_with(".gpx\""), "{disposition}");

        let document = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let text = std::str::from_utf8(&document).expect("utf-8 document");
        assert!(text.starts_with("<?xml"));
        assert_eq!(text.matches("<wpt ").count(), 6);

        // The parent row points at the stored file.
        let (status, json) = request(
            &app,
            Method::GET,
            &format!("/api/v1/searches/{search_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let stored_path = json["data"]["grid_file_path"]
            .as_str()
            .expect("grid_file_path set");
        assert!(
            stored_path.starts_with("/files/grids/Shevchenko_"),
            "{stored_path}"
        );
        assert!(json["data"]["grid_file_generated_at"].is_string());

        // And the static file route serves the exact same bytes.
        let file_response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(stored_path)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("file response");
        assert_eq!(file_response.status(), StatusCode::OK);
        let served = to_bytes(file_response.into_body(), usize::MAX)
            .await
            .expect("file bytes");
        assert_eq!(served, document);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn generate_grid_file_requires_complete_parameters(pool: sqlx::PgPool) {
        // Cell size left unset.
        let row = sargrid_db::create_search(
            &pool,
            "Хоменко",
            None,
            Some(50.45),
            Some(30.52),
            Some(3),
            Some(2),
            None,
        )
        .await
        .expect("seed search");
        let (app, _store_dir) = test_app(pool);

        let (status, json) = request(
            &app,
            Method::POST,
            &format!("/api/v1/searches/{}/grid/file", row.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"]["message"].as_str(),
            Some(grid_file::INCOMPLETE_PARAMS)
        );

        let (status, _) = request(
            &app,
            Method::POST,
            "/api/v1/searches/999999/grid/file",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn grid_cell_routes_enforce_codes_statuses_and_assignment(pool: sqlx::PgPool) {
        let search_id = seed_search(&pool).await;
        let team_id = seed_team(&pool, search_id, "Alpha").await;
        let (app, _store_dir) = test_app(pool);
        let base = format!("/api/v1/searches/{search_id}/cells");

        // Codes normalize to uppercase and default to unassigned.
        let (status, json) = request(
            &app,
            Method::POST,
            &base,
            Some(serde_json::json!({ "cell_code": "a1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["cell_code"].as_str(), Some("A1"));
        assert_eq!(json["data"]["status"].as_str(), Some("unassigned"));
        let cell_id = json["data"]["id"].as_i64().expect("cell id");

        // Same code again is a conflict.
        let (status, json) = request(
            &app,
            Method::POST,
            &base,
            Some(serde_json::json!({ "cell_code": "A1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"].as_str(), Some("conflict"));

        // Malformed codes and unknown statuses are validation errors.
        let (status, _) = request(
            &app,
            Method::POST,
            &base,
            Some(serde_json::json!({ "cell_code": "1A" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, json) = request(
            &app,
            Method::POST,
            &base,
            Some(serde_json::json!({ "cell_code": "B1", "status": "done" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]["message"]
            .as_str()
            .expect("message")
            .contains("'done'"));

        // An unassigned cell cannot reference a team, and the team must
        // exist under this search.
        let (status, _) = request(
            &app,
            Method::POST,
            &base,
            Some(serde_json::json!({ "cell_code": "B1", "assigned_field_search_id": team_id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = request(
            &app,
            Method::POST,
            &base,
            Some(serde_json::json!({
                "cell_code": "B1",
                "status": "assigned",
                "assigned_field_search_id": 999_999
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // A valid assignment sticks and shows up under the status filter.
        let (status, _) = request(
            &app,
            Method::POST,
            &base,
            Some(serde_json::json!({
                "cell_code": "B1",
                "status": "assigned",
                "assigned_field_search_id": team_id
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, json) =
            request(&app, Method::GET, &format!("{base}?status=assigned"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["data"][0]["cell_code"].as_str(), Some("B1"));

        // Sparse updates: status moves freely, but dropping back to
        // unassigned requires clearing the team in the same update.
        let cell_uri = format!("{base}/{cell_id}");
        let (status, json) = request(
            &app,
            Method::PATCH,
            &cell_uri,
            Some(serde_json::json!({
                "status": "assigned",
                "assigned_field_search_id": team_id
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["data"]["assigned_field_search_id"].as_i64(),
            Some(team_id)
        );

        let (status, _) = request(
            &app,
            Method::PATCH,
            &cell_uri,
            Some(serde_json::json!({ "status": "unassigned" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = request(
            &app,
            Method::PATCH,
            &cell_uri,
            Some(serde_json::json!({
                "status": "unassigned",
                "assigned_field_search_id": null
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"].as_str(), Some("unassigned"));
        assert!(json["data"]["assigned_field_search_id"].is_null());

        // Delete is scoped and final.
        let (status, _) = request(&app, Method::DELETE, &cell_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = request(&app, Method::DELETE, &cell_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn field_search_routes_scope_by_parent(pool: sqlx::PgPool) {
        let first = seed_search(&pool).await;
        let second = seed_search(&pool).await;
        let (app, _store_dir) = test_app(pool);

        let (status, json) = request(
            &app,
            Method::POST,
            "/api/v1/field-searches",
            Some(serde_json::json!({ "search_id": first, "team_name": "  Alpha  " })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["team_name"].as_str(), Some("Alpha"));

        let (status, _) = request(
            &app,
            Method::POST,
            "/api/v1/field-searches",
            Some(serde_json::json!({ "search_id": second, "team_name": "Bravo" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // A blank name and an unknown parent are both rejected.
        let (status, _) = request(
            &app,
            Method::POST,
            "/api/v1/field-searches",
            Some(serde_json::json!({ "search_id": first, "team_name": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = request(
            &app,
            Method::POST,
            "/api/v1/field-searches",
            Some(serde_json::json!({ "search_id": 999_999, "team_name": "Ghost" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, json) = request(
            &app,
            Method::GET,
            &format!("/api/v1/field-searches?search_id={first}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["team_name"].as_str(), Some("Alpha"));

        let (status, json) = request(&app, Method::GET, "/api/v1/field-searches", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().map(Vec::len), Some(2));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn rate_limit_kicks_in_after_too_many_requests(pool: sqlx::PgPool) {
        let dir = tempfile::tempdir().expect("tempdir");
        let auth = crate::middleware::AuthState::from_env(true).expect("auth");
        let state = AppState {
            pool,
            storage: GridStore::new(dir.path()),
            gpx_creator: "sargrid-tests".to_string(),
        };
        let app = build_app(state, auth, RateLimitState::new(2, Duration::from_secs(60)));

        for _ in 0..2 {
            let (status, _) = request(&app, Method::GET, "/api/v1/searches", None).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, json) = request(&app, Method::GET, "/api/v1/searches", None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"]["code"].as_str(), Some("rate_limited"));
    }
}
