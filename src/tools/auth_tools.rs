//! Login tool

use super::{Tool, ToolContext, ToolOutput};
use crate::engine::{login_flow, ProgressEvent};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_stream::StreamExt;

/// Drive the login sequence to its terminal event.
///
/// Streaming consumers use the SSE endpoint instead; this tool collapses
/// the same flow into its final status string.
pub struct LoginTool;

#[async_trait]
impl Tool for LoginTool {
    fn name(&self) -> &'static str {
        "login"
    }

    fn description(&self) -> String {
        "检查登录状态；未登录时打开浏览器窗口等待手动登录，直到成功或超时".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn run(&self, _input: Value, ctx: ToolContext) -> ToolOutput {
        let mut events = login_flow(ctx.engine.clone());

        let terminal = loop {
            tokio::select! {
                () = ctx.cancel.cancelled() => {
                    // Dropping the receiver stops the producer at its next send.
                    return ToolOutput::error("登录操作已取消");
                }
                event = events.next() => match event {
                    Some(event) if event.is_terminal() => break event,
                    Some(event) => {
                        tracing::debug!(status = event.status(), "login progress");
                    }
                    None => return ToolOutput::error("登录流程意外结束"),
                }
            }
        };

        match terminal {
            ProgressEvent::Completed { message, .. } => ToolOutput::success(message),
            ProgressEvent::Timeout { message } | ProgressEvent::Error { message } => {
                ToolOutput::error(message)
            }
            // is_terminal admits no other variants
            other => ToolOutput::error(format!("意外的终止事件: {}", other.status())),
        }
    }
}
