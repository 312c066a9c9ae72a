//! HTTP request handlers

use super::sse::{heartbeat_sse, progress_sse};
use super::types::{
    BrowserStatusResponse, ErrorResponse, HealthResponse, SearchStreamQuery, StatusResponse,
    ToolListResponse,
};
use super::AppState;
use crate::engine::{login_flow, search_flow};
use crate::tools::{validate, ToolContext, ToolOutput};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

const SERVICE: &str = "rednote-mcp";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/status", get(status_check))
        .route("/api/browser/status", get(browser_status))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", post(call_tool))
        .route("/api/search/stream", get(search_stream))
        .route("/api/login/stream", get(login_stream))
        .route("/sse", get(heartbeat))
        .with_state(state)
}

// ============================================================
// Introspection
// ============================================================

async fn root() -> Json<Value> {
    Json(json!({
        "service": SERVICE,
        "version": VERSION,
        "endpoints": {
            "health": "/health",
            "status": "/status",
            "browser_status": "/api/browser/status",
            "tools": "/api/tools",
            "call_tool": "/api/tools/{name}",
            "search_stream": "/api/search/stream",
            "login_stream": "/api/login/stream",
            "sse": "/sse",
        }
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE,
        version: VERSION,
        browser_ready: state.engine.browser_ready(),
    })
}

async fn status_check(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        service: SERVICE,
        version: VERSION,
        timestamp: chrono::Utc::now(),
        engine: state.engine.status().await,
    })
}

async fn browser_status(State(state): State<AppState>) -> Json<BrowserStatusResponse> {
    let status = state.engine.status().await;
    Json(BrowserStatusResponse {
        session: status.session,
        ready: state.engine.browser_ready(),
        headless: status.headless,
        profile_dir: status.profile_dir,
    })
}

// ============================================================
// Tool dispatch
// ============================================================

async fn list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: state.tools.definitions(),
    })
}

/// Dispatch a tool call.
///
/// Tool-level failures (validation, login required, extraction errors)
/// stay in-band as `{success: false}` — the HTTP status is reserved for
/// transport-level problems like an unknown tool name.
async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<ToolOutput>, AppError> {
    let input = body.map_or_else(|| json!({}), |Json(v)| v);
    let ctx = ToolContext::new(CancellationToken::new(), state.engine.clone());

    match state.tools.execute(&name, input, ctx).await {
        Some(output) => Ok(Json(output)),
        None => Err(AppError::NotFound(format!("未知工具: {name}"))),
    }
}

// ============================================================
// Streaming
// ============================================================

async fn search_stream(
    State(state): State<AppState>,
    Query(query): Query<SearchStreamQuery>,
) -> Result<Response, AppError> {
    let keywords =
        validate::keywords(&query.keywords).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let limit = validate::limit(query.limit.unwrap_or(5))
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let events = search_flow(state.engine.clone(), keywords, limit);
    Ok(progress_sse(events).into_response())
}

async fn login_stream(State(state): State<AppState>) -> Response {
    progress_sse(login_flow(state.engine.clone())).into_response()
}

async fn heartbeat() -> Response {
    heartbeat_sse().into_response()
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
