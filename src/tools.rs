//! Remotely invokable tools
//!
//! Tools are stateless singletons; everything a call needs arrives via
//! `ToolContext`. The tool names and input shapes are the durable contract
//! consumed by external dispatch layers.

mod auth_tools;
mod comment_tools;
mod note_tools;
pub mod validate;

pub use auth_tools::LoginTool;
pub use comment_tools::{PostCommentTool, PostSmartCommentTool};
pub use note_tools::{AnalyzeNoteTool, GetNoteCommentsTool, GetNoteContentTool, SearchNotesTool};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::engine::Engine;

/// Result from tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
        }
    }

    /// Success carrying a JSON payload as pretty text
    pub fn json(value: &impl Serialize) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self::success(text),
            Err(e) => Self::error(format!("序列化结果失败: {e}")),
        }
    }
}

/// All context needed for a tool invocation
#[derive(Clone)]
pub struct ToolContext {
    /// Cancellation signal for long-running operations
    pub cancel: CancellationToken,

    /// The shared browser engine
    pub engine: Arc<Engine>,
}

impl ToolContext {
    pub fn new(cancel: CancellationToken, engine: Arc<Engine>) -> Self {
        Self { cancel, engine }
    }
}

/// Trait for tools invokable by an external dispatch layer
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Tool description for callers
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute the tool with all context provided via `ToolContext`
    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput;
}

/// A tool definition as exposed over the wire
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Collection of all tools
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn standard() -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(LoginTool),
            Arc::new(SearchNotesTool),
            Arc::new(GetNoteContentTool),
            Arc::new(GetNoteCommentsTool),
            Arc::new(AnalyzeNoteTool),
            Arc::new(PostSmartCommentTool),
            Arc::new(PostCommentTool),
        ];
        Self { tools }
    }

    /// Get all tool definitions for the listing endpoint
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute a tool by name with context
    pub async fn execute(&self, name: &str, input: Value, ctx: ToolContext) -> Option<ToolOutput> {
        for tool in &self.tools {
            if tool.name() == name {
                return Some(tool.run(input, ctx).await);
            }
        }
        None
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contract_tools_registered() {
        let registry = ToolRegistry::standard();
        let defs = registry.definitions();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();

        for expected in [
            "login",
            "search_notes",
            "get_note_content",
            "get_note_comments",
            "analyze_note",
            "post_smart_comment",
            "post_comment",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        assert_eq!(names.len(), 7);
    }

    #[tokio::test]
    async fn unknown_tool_dispatches_to_none() {
        let registry = ToolRegistry::standard();
        let ctx = ToolContext::new(
            CancellationToken::new(),
            Arc::new(Engine::new(crate::config::Config::default())),
        );
        let result = registry.execute("does_not_exist", serde_json::json!({}), ctx).await;
        assert!(result.is_none());
    }
}
