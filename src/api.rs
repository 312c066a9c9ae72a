//! HTTP API
//!
//! Transport boundary over the browser engine: JSON endpoints for health
//! and tool dispatch, SSE endpoints for the streamed flows.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::engine::Engine;
use crate::tools::ToolRegistry;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            tools: Arc::new(ToolRegistry::standard()),
        }
    }
}
