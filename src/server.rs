use crate::error::{AppError, AppResult};
use crate::snapshot::load_state;
use crate::standings::compute_standings;
use crate::view::bracket_view;

use axum::{
    extract::State as AxumState,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, get_service},
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

#[derive(Clone)]
struct ServerState {
    state_path: Arc<PathBuf>,
}

const NO_STORE: [(&str, &str); 4] = [
    ("Content-Type", "application/json"),
    ("Cache-Control", "no-store"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

fn encode<T: Serialize>(payload: &T) -> (StatusCode, String) {
    match serde_json::to_string(payload) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }).to_string()),
    }
}

fn failure(err: AppError) -> (StatusCode, String) {
    let status = match err {
        AppError::MissingState(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!("snapshot unavailable: {err}");
    (status, json!({ "error": err.to_string() }).to_string())
}

/// Body for `/state.json`. The snapshot is re-read on every request.
pub fn state_payload(state_path: &Path) -> (StatusCode, String) {
    match load_state(state_path) {
        Ok(state) => encode(&bracket_view(&state.title, &state.bracket)),
        Err(err) => failure(err),
    }
}

pub fn standings_payload(state_path: &Path) -> (StatusCode, String) {
    match load_state(state_path) {
        Ok(state) => encode(&compute_standings(&state.participants, &state.bracket.matches, &state.points)),
        Err(err) => failure(err),
    }
}

async fn get_state_json(AxumState(state): AxumState<ServerState>) -> impl IntoResponse {
    let (status, body) = state_payload(&state.state_path);
    (status, NO_STORE, body)
}

async fn get_standings_json(AxumState(state): AxumState<ServerState>) -> impl IntoResponse {
    let (status, body) = standings_payload(&state.state_path);
    (status, NO_STORE, body)
}

pub fn router(state_path: PathBuf, static_dir: Option<PathBuf>) -> Router {
    let app = Router::new()
        .route("/state.json", get(get_state_json))
        .route("/standings.json", get(get_standings_json));
    let app = match static_dir {
        Some(dir) => app.fallback_service(get_service(ServeDir::new(dir))),
        None => app,
    };
    app.with_state(ServerState { state_path: Arc::new(state_path) })
}

async fn start_server(app: Router, addr: &str) -> AppResult<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("failed to bind {addr}: {e}")))?;
    info!("bracket server listening at http://{addr}/");
    axum::serve(listener, app).await.map_err(|e| {
        error!("bracket server error: {e}");
        AppError::Server(e.to_string())
    })
}

/// Serve until the process is stopped. Nothing here writes to the snapshot.
pub fn serve(state_path: PathBuf, static_dir: Option<PathBuf>, addr: &str) -> AppResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(AppError::io("start tokio runtime"))?;
    let app = router(state_path, static_dir);
    runtime.block_on(start_server(app, addr))
}
