//! HTTP access surface.
//!
//! Exposes the course search engine via a small JSON API, suitable for the
//! course-advisor web frontend or any other HTTP client.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/health` | Readiness and number of courses loaded |
//! | `POST` | `/api/search` | Rank courses against `{ "query": ..., "top_k": ... }` |
//! | `GET`  | `/api/courses` | List courses in catalog order (`?limit=N`) |
//!
//! # Error Contract
//!
//! All error responses share one shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_ready` (503),
//! `embedding_failed` (502), `internal` (500).
//!
//! # Readiness
//!
//! The listener starts before the engine finishes initializing. Until then
//! `/api/health` reports `"status": "loading"` and the other endpoints
//! answer 503.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser frontend
//! served from another origin can call the API.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use course_advisor_core::{AdvisorError, CourseRecord, EngineHandle, HealthStatus, SearchHit};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::bootstrap::spawn_initialization;
use crate::config::{Config, RetrievalConfig};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    /// Current engine, or the reason there is none yet.
    handle: Arc<EngineHandle>,
    /// Result-count defaults and cap.
    retrieval: Arc<RetrievalConfig>,
}

/// Starts the HTTP server and initializes the engine in the background.
///
/// Binds to `[server].bind`, begins answering health checks immediately,
/// and serves queries once initialization completes. On Unix, `SIGHUP`
/// triggers a full catalog reload.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let handle = Arc::new(EngineHandle::new());
    let config = Arc::new(config.clone());
    spawn_initialization(handle.clone(), config.clone());

    #[cfg(unix)]
    spawn_reload_on_sighup(handle.clone(), config.clone())?;

    run_server_with_handle(&config, handle).await
}

/// Starts the HTTP server around an existing [`EngineHandle`].
///
/// The caller owns initialization. Used by tests and custom binaries that
/// build the engine themselves.
pub async fn run_server_with_handle(
    config: &Config,
    handle: Arc<EngineHandle>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(handle, config.retrieval.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "course advisor API listening");
    println!("Course advisor API listening on http://{}", bind_addr);
    println!("  GET  /api/health  - health check");
    println!("  POST /api/search  - search courses (body: {{query, top_k?}})");
    println!("  GET  /api/courses - list courses (?limit=N)");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the API router.
pub fn router(handle: Arc<EngineHandle>, retrieval: RetrievalConfig) -> Router {
    let state = AppState {
        handle,
        retrieval: Arc::new(retrieval),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/search", post(handle_search))
        .route("/api/courses", get(handle_courses))
        .layer(cors)
        .with_state(state)
}

#[cfg(unix)]
fn spawn_reload_on_sighup(handle: Arc<EngineHandle>, config: Arc<Config>) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            // Errors are logged inside reload; the old engine keeps serving.
            let _ = crate::bootstrap::reload(&handle, &config).await;
        }
    });
    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_ready"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AdvisorError> for AppError {
    fn from(err: AdvisorError) -> Self {
        let (status, code) = match &err {
            AdvisorError::EmptyQuery => (StatusCode::BAD_REQUEST, "bad_request"),
            AdvisorError::NotReady(_) => (StatusCode::SERVICE_UNAVAILABLE, "not_ready"),
            AdvisorError::ProviderRuntime(_) => (StatusCode::BAD_GATEWAY, "embedding_failed"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

// ============ GET /api/health ============

/// Handler for `GET /api/health`.
///
/// Always 200 once the process is up; readiness is in the `status` field.
async fn handle_health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.handle.status())
}

// ============ POST /api/search ============

#[derive(Debug, Deserialize)]
struct SearchRequest {
    #[serde(default)]
    query: String,
    #[serde(default, alias = "topK")]
    top_k: Option<i64>,
}

/// One course in a search response.
#[derive(Debug, Serialize)]
struct SearchCourse {
    code: String,
    title: String,
    description: String,
    department: String,
    similarity: f32,
}

impl From<SearchHit> for SearchCourse {
    fn from(hit: SearchHit) -> Self {
        let CourseRecord {
            code,
            name,
            description,
            department,
            ..
        } = hit.record;
        SearchCourse {
            code,
            title: name,
            description: description.unwrap_or_else(|| "No description available".to_string()),
            department: department.unwrap_or_else(|| "N/A".to_string()),
            similarity: hit.score,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    query: String,
    courses: Vec<SearchCourse>,
}

/// Resolve the requested result count: default when absent, negatives clamp
/// to zero, and the configured cap applies last.
fn effective_top_k(requested: Option<i64>, retrieval: &RetrievalConfig) -> usize {
    let k = match requested {
        Some(k) => usize::try_from(k.max(0)).unwrap_or(usize::MAX),
        None => retrieval.default_top_k,
    };
    match retrieval.max_top_k {
        Some(max) => k.min(max),
        None => k,
    }
}

/// Handler for `POST /api/search`.
///
/// Returns 400 for a blank query, 503 before the engine is ready, and 502
/// when the embedding provider fails.
async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let engine = state.handle.engine()?;
    let k = effective_top_k(req.top_k, &state.retrieval);
    let result = engine.search(&req.query, k).await?;

    Ok(Json(SearchResponse {
        query: result.query,
        courses: result.hits.into_iter().map(SearchCourse::from).collect(),
    }))
}

// ============ GET /api/courses ============

#[derive(Debug, Deserialize)]
struct CoursesQuery {
    limit: Option<usize>,
}

/// One course in a listing response.
#[derive(Debug, Serialize)]
struct ListedCourse {
    code: String,
    title: String,
    description: String,
    department: String,
}

impl From<&CourseRecord> for ListedCourse {
    fn from(record: &CourseRecord) -> Self {
        ListedCourse {
            code: record.code.clone(),
            title: record.name.clone(),
            description: record.description.clone().unwrap_or_default(),
            department: record
                .department
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct CoursesResponse {
    courses: Vec<ListedCourse>,
    total: usize,
}

/// Handler for `GET /api/courses`.
async fn handle_courses(
    State(state): State<AppState>,
    Query(params): Query<CoursesQuery>,
) -> Result<Json<CoursesResponse>, AppError> {
    let engine = state.handle.engine()?;
    let listing = engine.list_all(params.limit);

    Ok(Json(CoursesResponse {
        courses: listing.courses.into_iter().map(ListedCourse::from).collect(),
        total: listing.total,
    }))
}
