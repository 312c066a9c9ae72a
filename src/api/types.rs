//! API request and response types

use serde::{Deserialize, Serialize};

use crate::engine::{EngineStatus, SessionState};
use crate::tools::ToolDefinition;

/// Query parameters for the streamed search endpoint
#[derive(Debug, Deserialize)]
pub struct SearchStreamQuery {
    pub keywords: String,
    pub limit: Option<i64>,
}

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub browser_ready: bool,
}

/// Process/session introspection response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub engine: EngineStatus,
}

/// Session-level detail for the browser status endpoint
#[derive(Debug, Serialize)]
pub struct BrowserStatusResponse {
    pub session: SessionState,
    pub ready: bool,
    pub headless: bool,
    pub profile_dir: String,
}

/// Tool listing response
#[derive(Debug, Serialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDefinition>,
}

/// Error payload for non-2xx responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
