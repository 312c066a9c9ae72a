//! Comment tools

use super::{validate, Tool, ToolContext, ToolOutput};
use crate::engine::analysis;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

// ============================================================================
// post_comment
// ============================================================================

#[derive(Debug, Deserialize)]
struct PostCommentInput {
    url: String,
    comment: String,
}

pub struct PostCommentTool;

#[async_trait]
impl Tool for PostCommentTool {
    fn name(&self) -> &'static str {
        "post_comment"
    }

    fn description(&self) -> String {
        "在指定笔记下发布评论（需要已登录）".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["url", "comment"],
            "properties": {
                "url": {
                    "type": "string",
                    "description": "笔记URL，必须指向小红书"
                },
                "comment": {
                    "type": "string",
                    "description": "评论内容，1-500字符"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: PostCommentInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("参数无效: {e}")),
        };

        let url = match validate::note_url(&input.url) {
            Ok(u) => u,
            Err(e) => return ToolOutput::error(e.to_string()),
        };
        let comment = match validate::comment(&input.comment) {
            Ok(c) => c,
            Err(e) => return ToolOutput::error(e.to_string()),
        };

        match ctx.engine.post_comment(&url, &comment).await {
            Ok(()) => ToolOutput::success("评论发布成功"),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}

// ============================================================================
// post_smart_comment
// ============================================================================

#[derive(Debug, Deserialize)]
struct SmartCommentInput {
    url: String,
    comment_type: String,
}

/// Analyze a note and return style guidance for writing a comment.
///
/// The natural-language comment itself is written by the caller, then
/// posted with `post_comment` — this tool never generates or posts text.
pub struct PostSmartCommentTool;

#[async_trait]
impl Tool for PostSmartCommentTool {
    fn name(&self) -> &'static str {
        "post_smart_comment"
    }

    fn description(&self) -> String {
        "分析笔记并返回指定风格（引流/点赞/咨询/专业）的评论写作指引，由调用方撰写后用 post_comment 发布".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["url", "comment_type"],
            "properties": {
                "url": {
                    "type": "string",
                    "description": "笔记URL，必须指向小红书"
                },
                "comment_type": {
                    "type": "string",
                    "enum": ["引流", "点赞", "咨询", "专业"],
                    "description": "评论风格"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: SmartCommentInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("参数无效: {e}")),
        };

        let url = match validate::note_url(&input.url) {
            Ok(u) => u,
            Err(e) => return ToolOutput::error(e.to_string()),
        };

        let guidance = analysis::comment_guide(&input.comment_type);

        match ctx.engine.analyze_note(&url).await {
            Ok(result) => ToolOutput::json(&json!({
                "note": result.note,
                "domains": result.domains,
                "keywords": result.keywords,
                "comment_type": input.comment_type,
                "guidance": guidance,
            })),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}
