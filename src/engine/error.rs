//! Error taxonomy for the browser engine
//!
//! Every failure mode a caller can observe funnels through [`EngineError`].
//! Transport code maps variants to HTTP statuses; the engine itself only
//! decides which failures are transient (retryable) and which are not.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad input shape; surfaced verbatim, never retried
    #[error("参数无效: {0}")]
    Validation(String),

    /// Browser launch failed; the session slot stays retryable
    #[error("浏览器初始化失败: {0}")]
    SessionInit(String),

    /// Transient page-load failure; Navigator retries these
    #[error("页面加载失败: {0}")]
    PageLoad(String),

    /// All candidates for a required control were exhausted
    #[error("未找到页面元素: {field}")]
    ElementNotFound { field: &'static str },

    /// Operation needs an authenticated session
    #[error("需要先登录")]
    LoginRequired,

    /// Anything unexpected, wrapped with the original message
    #[error("操作失败: {0}")]
    Operation(String),
}

impl EngineError {
    /// Whether the Navigator's retry policy should re-attempt after this
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::PageLoad(_))
    }
}

impl From<chromiumoxide::error::CdpError> for EngineError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        EngineError::Operation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_page_load_is_transient() {
        assert!(EngineError::PageLoad("timeout".into()).is_transient());
        assert!(!EngineError::Validation("bad".into()).is_transient());
        assert!(!EngineError::SessionInit("no chrome".into()).is_transient());
        assert!(!EngineError::LoginRequired.is_transient());
        assert!(!EngineError::ElementNotFound { field: "title" }.is_transient());
        assert!(!EngineError::Operation("boom".into()).is_transient());
    }
}
