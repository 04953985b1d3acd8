//! HTTP API for the stress barometer dashboard.
//!
//! This module provides an HTTP server that:
//! - Lists and selects the data directory recordings are read from
//! - Discovers the subjects available in that directory
//! - Serves bounded previews of a participant's recording
//! - Serves the stress assessment with optional windowed history
//!
//! # Architecture
//!
//! ```text
//! Dashboard ──→ GET /api/stress_state ──→ DataSource ──→ Recording
//!                                                          ↓
//!                                      [Features → Classifier → History]
//! ```
//!
//! Recording loads and the computations over them run on the blocking pool.
//! The only state shared between requests is the selected data directory,
//! which every handler snapshots into its own [`DataSource`].

use crate::assessment::{evaluate, AssessmentRequest, StressAssessment};
use crate::config::Config;
use crate::inspect::{inspect, InspectRequest, ParamSelection, ParticipantInfo};
use crate::signal::IndexRange;
use crate::store::{subject_label, DataSource, LoadError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Application configuration shared by all requests
    pub app: Config,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16, app: Config) -> Self {
        Self { port, app }
    }
}

/// Shared server state
pub struct ServerState {
    config: Config,
    /// Data directory picked through `/data_dir`
    data_dir_override: RwLock<Option<PathBuf>>,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            config: config.app.clone(),
            data_dir_override: RwLock::new(None),
        }
    }

    /// Data source for one request.
    async fn source(&self) -> DataSource {
        let selected = self.data_dir_override.read().await.clone();
        DataSource::from_config(&self.config).with_override(selected)
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
}

/// Data directory response
#[derive(Serialize)]
pub struct DataDirResponse {
    pub data_dir: PathBuf,
    pub files: Vec<String>,
}

/// Subject listing response
#[derive(Serialize)]
pub struct ParticipantsResponse {
    pub data_dir: PathBuf,
    pub files: Vec<String>,
    pub subjects_by_file: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
            info: None,
        }),
    )
}

fn load_error(e: LoadError) -> ApiError {
    match e {
        LoadError::AmbiguousSubject { ref subjects_by_file } => {
            let info = json!({ "subjects_by_file": subjects_by_file });
            let (status, Json(mut body)) = api_error(
                StatusCode::BAD_REQUEST,
                "NO_DEFAULT_SUBJECT",
                format!("Cannot detect the participant automatically: {}", e),
            );
            body.info = Some(info);
            (status, Json(body))
        }
        e if e.is_not_found() => api_error(StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string()),
        e => {
            tracing::error!("Failed to load recording: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "LOAD_ERROR", e.to_string())
        }
    }
}

/// Run a loader call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, LoadError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                format!("Request task failed: {}", e),
            )
        })?
        .map_err(load_error)
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "True"))
}

/// GET /
async fn home() -> &'static str {
    "Synheart Barometer API is running"
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct DataDirQuery {
    dir: Option<String>,
}

/// GET /data_dir
///
/// Shows the data directory, or selects one with `?dir=`. `auto` and `reset`
/// return to automatic selection.
async fn data_dir(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<DataDirQuery>,
) -> Result<Json<DataDirResponse>, ApiError> {
    if let Some(dir) = query.dir {
        if matches!(dir.to_lowercase().as_str(), "auto" | "reset" | "") {
            *state.data_dir_override.write().await = None;
            tracing::info!("Data directory reset to automatic selection");
        } else {
            let located = DataSource::from_config(&state.config)
                .locate_dir(&dir)
                .ok_or_else(|| {
                    api_error(
                        StatusCode::BAD_REQUEST,
                        "INVALID_DIR",
                        format!("Directory does not exist: {}", dir),
                    )
                })?;
            tracing::info!("Data directory set to {:?}", located);
            *state.data_dir_override.write().await = Some(located);
        }
    }

    let source = state.source().await;
    Ok(Json(DataDirResponse {
        data_dir: source.resolve_dir(),
        files: source.list_files(),
    }))
}

#[derive(Debug, Deserialize)]
struct ParticipantsQuery {
    file: Option<String>,
}

/// GET /participants
async fn participants(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ParticipantsQuery>,
) -> Result<Json<ParticipantsResponse>, ApiError> {
    let source = state.source().await;
    let data_dir = source.resolve_dir();
    if !data_dir.is_dir() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_DIR",
            format!("Data directory does not exist: {}", data_dir.display()),
        ));
    }

    let by_file = blocking(move || source.subjects_by_file(query.file.as_deref())).await?;

    let subjects_by_file: BTreeMap<String, Value> = by_file
        .into_iter()
        .map(|(file, subjects)| {
            let value = match subjects {
                Ok(subjects) => json!(subjects),
                Err(e) => {
                    tracing::warn!("Subject discovery failed for {}: {}", file, e);
                    json!({ "error": e.to_string() })
                }
            };
            (file, value)
        })
        .collect();

    Ok(Json(ParticipantsResponse {
        data_dir,
        files: subjects_by_file.keys().cloned().collect(),
        note: subjects_by_file
            .is_empty()
            .then(|| "No .json recordings in the data directory".to_string()),
        subjects_by_file,
    }))
}

#[derive(Debug, Default, Deserialize)]
struct InspectQuery {
    subject: Option<String>,
    n: Option<String>,
    full: Option<String>,
    range: Option<String>,
    params: Option<String>,
}

impl InspectQuery {
    fn to_request(&self, default_n: usize) -> InspectRequest {
        InspectRequest {
            n: self
                .n
                .as_deref()
                .and_then(|n| n.trim().parse().ok())
                .unwrap_or(default_n),
            full: is_truthy(self.full.as_deref()),
            range: self.range.as_deref().and_then(IndexRange::parse),
            params: self.params.as_deref().map(ParamSelection::parse),
        }
    }
}

/// Subject from the query, or the only subject in the data directory.
async fn resolve_subject(source: &DataSource, subject: Option<String>) -> Result<String, ApiError> {
    match subject.filter(|s| !s.trim().is_empty()) {
        Some(subject) => Ok(subject),
        None => {
            let source = source.clone();
            blocking(move || source.default_subject()).await
        }
    }
}

async fn participant_info(
    state: &ServerState,
    subject: Option<String>,
    query: &InspectQuery,
) -> Result<Json<ParticipantInfo>, ApiError> {
    let source = state.source().await;
    let subject = resolve_subject(&source, subject).await?;
    let request = query.to_request(state.config.default_sample_size);
    tracing::debug!("Inspecting {} ({:?})", subject, request);

    let info = blocking(move || {
        let recording = source.load_subject(&subject)?;
        Ok(inspect(&recording, &subject_label(&subject), &request))
    })
    .await?;

    Ok(Json(info))
}

/// GET /participant/:id
async fn participant_by_id(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Query(query): Query<InspectQuery>,
) -> Result<Json<ParticipantInfo>, ApiError> {
    participant_info(&state, Some(id), &query).await
}

/// GET /participant
///
/// Uses `?subject=`, falling back to the only subject in the data directory.
async fn participant_auto(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<InspectQuery>,
) -> Result<Json<ParticipantInfo>, ApiError> {
    participant_info(&state, query.subject.clone(), &query).await
}

#[derive(Debug, Deserialize)]
struct StressStateQuery {
    subject: Option<String>,
    range: Option<String>,
    windows: Option<String>,
    window_size: Option<String>,
}

/// GET /api/stress_state
async fn stress_state(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<StressStateQuery>,
) -> Result<Json<StressAssessment>, ApiError> {
    let source = state.source().await;
    let subject = resolve_subject(&source, query.subject).await?;

    let parse = |v: Option<String>| v.and_then(|v| v.trim().parse::<usize>().ok());
    let request = AssessmentRequest {
        range: query.range.as_deref().and_then(IndexRange::parse),
        windows: parse(query.windows).unwrap_or(0),
        window_size: parse(query.window_size).unwrap_or(state.config.default_window_size),
    };

    let assessment = blocking(move || {
        let recording = source.load_subject(&subject)?;
        Ok(evaluate(&recording, &subject, &request))
    })
    .await?;

    tracing::info!(
        "Stress state for {}: {} (score {:?})",
        assessment.subject,
        assessment.state,
        assessment.score
    );

    Ok(Json(assessment))
}

/// Build the router with all routes and the CORS layer.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/data_dir", get(data_dir))
        .route("/participants", get(participants))
        .route("/participant", get(participant_auto))
        .route("/participant/:id", get(participant_by_id))
        .route("/api/stress_state", get(stress_state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: ServerConfig) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(&config));
    let app = router(state);

    let listener = TcpListener::bind((config.app.bind_address.as_str(), config.port)).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Barometer server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
