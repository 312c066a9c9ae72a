//! Browser session lifecycle
//!
//! Exactly one Chrome session exists per process. It is launched lazily on
//! first use with a persisted profile directory so login cookies survive
//! restarts, and every lifecycle transition happens under a single async
//! mutex. The mutex guards initialization and teardown only — it is
//! released before navigation or extraction begins, so concurrent callers
//! queue for the launch and then share the one page handle.

use chromiumoxide::{
    browser::{Browser, BrowserConfig},
    fetcher::{BrowserFetcher, BrowserFetcherOptions},
    Page,
};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::error::EngineError;
use crate::config::Config;

/// Viewport matching a desktop browsing identity
const VIEWPORT_WIDTH: u32 = 1920;
const VIEWPORT_HEIGHT: u32 = 1080;

/// Lifecycle state of the one browser session
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    Closed,
}

/// Live browser plus its single active page
struct SessionHandle {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
}

enum Slot {
    Uninitialized,
    Ready(Box<SessionHandle>),
    Closed,
}

/// Owner of the process-wide browser session
pub struct SessionManager {
    config: Config,
    slot: Mutex<Slot>,
}

impl SessionManager {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            slot: Mutex::new(Slot::Uninitialized),
        }
    }

    /// Get the active page, launching the browser first if necessary.
    ///
    /// Reentrant-safe: concurrent callers serialize on the slot mutex and
    /// all but the first see the already-ready session. A launch failure
    /// leaves the slot untouched so the next caller can retry.
    pub async fn ensure_ready(&self) -> Result<Page, EngineError> {
        let mut slot = self.slot.lock().await;
        if let Slot::Ready(handle) = &*slot {
            return Ok(handle.page.clone());
        }

        // Uninitialized (or previously closed) — launch while holding the
        // lock so only one Chrome ever starts.
        let handle = SessionHandle::launch(&self.config).await?;
        let page = handle.page.clone();
        *slot = Slot::Ready(Box::new(handle));
        tracing::info!(profile = %self.config.browser_data_dir.display(), "browser session ready");
        Ok(page)
    }

    /// Close the browser. Idempotent: a no-op when nothing is running.
    pub async fn close(&self) {
        let mut slot = self.slot.lock().await;
        if let Slot::Ready(handle) = std::mem::replace(&mut *slot, Slot::Closed) {
            let SessionHandle {
                mut browser,
                handler_task,
                page,
            } = *handle;
            drop(page);
            if let Err(e) = browser.close().await {
                tracing::warn!(error = %e, "browser close reported an error");
            }
            handler_task.abort();
            tracing::info!("browser session closed");
        }
    }

    /// Snapshot of the lifecycle state for introspection endpoints.
    ///
    /// The slot mutex is held only during launch/teardown, so failing to
    /// acquire it immediately means a transition is in flight.
    pub fn state(&self) -> SessionState {
        match self.slot.try_lock() {
            Ok(slot) => match &*slot {
                Slot::Uninitialized => SessionState::Uninitialized,
                Slot::Ready(_) => SessionState::Ready,
                Slot::Closed => SessionState::Closed,
            },
            Err(_) => SessionState::Initializing,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }
}

impl SessionHandle {
    /// Directory where the fetcher caches downloaded Chrome binaries
    fn fetcher_cache_dir() -> PathBuf {
        let base = std::env::var("HOME").map_or_else(|_| PathBuf::from("/tmp"), PathBuf::from);
        base.join(".cache/rednote-mcp/chromium")
    }

    /// Build a `BrowserConfig` with the persisted profile directory and
    /// optional explicit Chrome executable path.
    fn browser_config(config: &Config, executable: Option<&Path>) -> Result<BrowserConfig, EngineError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .user_data_dir(&config.browser_data_dir)
            .viewport(chromiumoxide::handler::viewport::Viewport {
                width: VIEWPORT_WIDTH,
                height: VIEWPORT_HEIGHT,
                device_scale_factor: Some(1.0),
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            });

        builder = if config.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };

        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(EngineError::SessionInit)
    }

    async fn launch_with(config: &Config, executable: Option<&Path>) -> Result<Self, EngineError> {
        let browser_config = Self::browser_config(config, executable)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| EngineError::SessionInit(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!("CDP handler error: {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::SessionInit(e.to_string()))?;

        Ok(Self {
            browser,
            handler_task,
            page,
        })
    }

    /// Launch Chrome for this process.
    ///
    /// Tries system Chrome first (zero download). On failure, downloads a
    /// compatible Chromium via `BrowserFetcher` and caches it for future
    /// runs.
    async fn launch(config: &Config) -> Result<Self, EngineError> {
        // The profile directory is deliberately kept across runs: it holds
        // the authentication cookies. An unusable path is a configuration
        // error, not a missing-Chrome condition, so it fails before any
        // launch or download attempt.
        std::fs::create_dir_all(&config.browser_data_dir)
            .map_err(|e| EngineError::SessionInit(format!("profile dir: {e}")))?;

        match Self::launch_with(config, None).await {
            Ok(handle) => return Ok(handle),
            Err(e) => {
                tracing::info!("system Chrome not available ({e}), trying fetcher...");
            }
        }

        let cache_dir = Self::fetcher_cache_dir();
        tracing::info!("downloading Chrome to {cache_dir:?} (first run only)...");

        std::fs::create_dir_all(&cache_dir).map_err(|e| {
            EngineError::SessionInit(format!("cache dir {}: {e}", cache_dir.display()))
        })?;

        let fetcher_opts = BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .map_err(|e| EngineError::SessionInit(format!("fetcher config: {e}")))?;

        let fetcher = BrowserFetcher::new(fetcher_opts);
        let info = fetcher
            .fetch()
            .await
            .map_err(|e| EngineError::SessionInit(format!("Chrome download failed: {e:#}")))?;

        tracing::info!("using Chrome at {:?}", info.executable_path);

        Self::launch_with(config, Some(&info.executable_path)).await
    }
}
