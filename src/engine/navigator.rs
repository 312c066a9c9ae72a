//! Page navigation with bounded retry
//!
//! Navigation is the one operation against the target application that
//! fails transiently often enough to deserve a policy: up to three
//! attempts with exponential backoff, applied only to page-load failures.
//! The policy is an explicit value so the budget lives in one place
//! instead of being baked into any particular error type.

use chromiumoxide::Page;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::error::EngineError;
use super::session::SessionManager;
use crate::config::Config;

/// Retry budget for transient failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the attempt after `attempt` (1-based): doubles each
    /// time, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.backoff_base.saturating_mul(1 << exp);
        delay.min(self.backoff_cap)
    }
}

/// Run `op`, re-attempting transient failures per `policy`.
///
/// Non-transient errors surface immediately; transient ones surface after
/// the attempt budget is exhausted.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(attempt, ?delay, error = %e, "retrying after transient failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Drives page navigation on the shared session
pub struct Navigator {
    sessions: Arc<SessionManager>,
    policy: RetryPolicy,
    page_timeout: Duration,
    settle_timeout: Duration,
}

impl Navigator {
    pub fn new(sessions: Arc<SessionManager>, config: &Config) -> Self {
        Self {
            sessions,
            policy: RetryPolicy {
                max_attempts: config.max_retry_attempts,
                ..RetryPolicy::default()
            },
            page_timeout: config.page_timeout,
            settle_timeout: config.settle_timeout,
        }
    }

    /// Navigate the shared page to `url` and wait for rendering to settle.
    ///
    /// Transient load failures are retried per the policy; each attempt
    /// re-acquires the session, so a session torn down between attempts is
    /// relaunched.
    pub async fn navigate(&self, url: &str) -> Result<Page, EngineError> {
        run_with_retry(&self.policy, || self.attempt(url)).await
    }

    async fn attempt(&self, url: &str) -> Result<Page, EngineError> {
        let page = self.sessions.ensure_ready().await?;

        match tokio::time::timeout(self.page_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(classify_goto_error(&e, url)),
            Err(_) => return Err(EngineError::PageLoad(format!("加载超时: {url}"))),
        }

        // Content renders asynchronously after the initial load; wait for
        // the next navigation-idle signal or the settle budget, whichever
        // comes first.
        let _ = tokio::time::timeout(self.settle_timeout, page.wait_for_navigation()).await;

        Ok(page)
    }
}

/// A rejected URL is a caller mistake, not a flaky page load — it must not
/// consume retry attempts.
fn classify_goto_error(e: &chromiumoxide::error::CdpError, url: &str) -> EngineError {
    let message = e.to_string();
    if message.to_lowercase().contains("invalid") {
        EngineError::Operation(format!("无效URL {url}: {message}"))
    } else {
        EngineError::PageLoad(format!("{url}: {message}"))
    }
}
