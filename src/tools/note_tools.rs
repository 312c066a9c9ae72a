//! Note search, retrieval, and analysis tools

use super::{validate, Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

fn default_limit() -> i64 {
    5
}

// ============================================================================
// search_notes
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchNotesInput {
    keywords: String,
    #[serde(default = "default_limit")]
    limit: i64,
}

pub struct SearchNotesTool;

#[async_trait]
impl Tool for SearchNotesTool {
    fn name(&self) -> &'static str {
        "search_notes"
    }

    fn description(&self) -> String {
        "按关键词搜索笔记，返回去重后的 {title, url} 列表".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["keywords"],
            "properties": {
                "keywords": {
                    "type": "string",
                    "description": "搜索关键词，1-50字符，不含 < > \" ' & ;"
                },
                "limit": {
                    "type": "integer",
                    "description": "返回数量上限，1-20（默认5）"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: SearchNotesInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("参数无效: {e}")),
        };

        let keywords = match validate::keywords(&input.keywords) {
            Ok(k) => k,
            Err(e) => return ToolOutput::error(e.to_string()),
        };
        let limit = match validate::limit(input.limit) {
            Ok(l) => l,
            Err(e) => return ToolOutput::error(e.to_string()),
        };

        match ctx.engine.search_notes(&keywords, limit).await {
            Ok(hits) => ToolOutput::json(&json!({
                "keywords": keywords,
                "total": hits.len(),
                "data": hits,
            })),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}

// ============================================================================
// get_note_content
// ============================================================================

#[derive(Debug, Deserialize)]
struct NoteUrlInput {
    url: String,
}

pub struct GetNoteContentTool;

#[async_trait]
impl Tool for GetNoteContentTool {
    fn name(&self) -> &'static str {
        "get_note_content"
    }

    fn description(&self) -> String {
        "抓取指定笔记的标题、作者、发布时间和正文".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["url"],
            "properties": {
                "url": {
                    "type": "string",
                    "description": "笔记URL，必须指向小红书"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: NoteUrlInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("参数无效: {e}")),
        };

        let url = match validate::note_url(&input.url) {
            Ok(u) => u,
            Err(e) => return ToolOutput::error(e.to_string()),
        };

        match ctx.engine.get_note(&url).await {
            Ok(note) => ToolOutput::json(&note),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}

// ============================================================================
// get_note_comments
// ============================================================================

pub struct GetNoteCommentsTool;

#[async_trait]
impl Tool for GetNoteCommentsTool {
    fn name(&self) -> &'static str {
        "get_note_comments"
    }

    fn description(&self) -> String {
        "抓取指定笔记的评论列表（最多10条）".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["url"],
            "properties": {
                "url": {
                    "type": "string",
                    "description": "笔记URL，必须指向小红书"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: NoteUrlInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("参数无效: {e}")),
        };

        let url = match validate::note_url(&input.url) {
            Ok(u) => u,
            Err(e) => return ToolOutput::error(e.to_string()),
        };

        match ctx.engine.get_comments(&url).await {
            Ok(comments) => ToolOutput::json(&json!({
                "total": comments.len(),
                "comments": comments,
            })),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}

// ============================================================================
// analyze_note
// ============================================================================

pub struct AnalyzeNoteTool;

#[async_trait]
impl Tool for AnalyzeNoteTool {
    fn name(&self) -> &'static str {
        "analyze_note"
    }

    fn description(&self) -> String {
        "抓取笔记并分析：返回内容、领域标签和命中的关键词".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["url"],
            "properties": {
                "url": {
                    "type": "string",
                    "description": "笔记URL，必须指向小红书"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: NoteUrlInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("参数无效: {e}")),
        };

        let url = match validate::note_url(&input.url) {
            Ok(u) => u,
            Err(e) => return ToolOutput::error(e.to_string()),
        };

        match ctx.engine.analyze_note(&url).await {
            Ok(analysis) => ToolOutput::json(&analysis),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::Engine;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn test_context() -> ToolContext {
        ToolContext::new(CancellationToken::new(), Arc::new(Engine::new(Config::default())))
    }

    #[tokio::test]
    async fn search_rejects_forbidden_characters_before_browsing() {
        let result = SearchNotesTool
            .run(json!({"keywords": "美食<script>"}), test_context())
            .await;
        assert!(!result.success);
        assert!(result.output.contains("非法字符"), "{}", result.output);
    }

    #[tokio::test]
    async fn search_rejects_out_of_range_limit() {
        let result = SearchNotesTool
            .run(json!({"keywords": "美食", "limit": 50}), test_context())
            .await;
        assert!(!result.success);
        assert!(result.output.contains("1-20"), "{}", result.output);
    }

    #[tokio::test]
    async fn search_rejects_missing_keywords() {
        let result = SearchNotesTool.run(json!({}), test_context()).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn note_tools_reject_foreign_urls() {
        for tool in [
            &GetNoteContentTool as &dyn Tool,
            &GetNoteCommentsTool as &dyn Tool,
            &AnalyzeNoteTool as &dyn Tool,
        ] {
            let result = tool
                .run(json!({"url": "https://example.com/explore/1"}), test_context())
                .await;
            assert!(!result.success, "{} accepted a foreign URL", tool.name());
        }
    }
}
