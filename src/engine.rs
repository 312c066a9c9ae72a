//! Browser-session lifecycle manager and extraction/interaction engine
//!
//! Owns the single automated browser session and everything that drives
//! it: navigation with retry, login-state detection, selector-fallback
//! resolution, structured extraction, comment posting, and streamed
//! multi-step flows. The HTTP layer above consumes this through [`Engine`].

pub mod analysis;
mod auth;
mod error;
mod events;
mod extract;
mod interact;
mod navigator;
mod selectors;
mod session;


pub use auth::AuthState;
pub use error::EngineError;
pub use events::{login_flow, search_flow, ProgressEvent};
pub use extract::{normalize_url, Comment, Note, NoteSummary, MAX_COMMENTS, TARGET_DOMAIN};
pub use session::SessionState;

use analysis::NoteAnalysis;
use auth::AuthStateMachine;
use chromiumoxide::Page;
use extract::HOME_URL;
use navigator::Navigator;
use serde::Serialize;
use session::SessionManager;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Introspection snapshot for the status endpoints
#[derive(Debug, Serialize)]
pub struct EngineStatus {
    pub session: SessionState,
    pub auth: AuthState,
    pub uptime_secs: u64,
    pub headless: bool,
    pub profile_dir: String,
}

/// Facade over the one browser session and its operations.
///
/// Construction is cheap and never touches the browser; the session
/// launches lazily on the first operation that needs it.
pub struct Engine {
    config: Config,
    sessions: Arc<SessionManager>,
    navigator: Navigator,
    auth: AuthStateMachine,
    started_at: Instant,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let sessions = Arc::new(SessionManager::new(config.clone()));
        let navigator = Navigator::new(sessions.clone(), &config);
        let auth = AuthStateMachine::new(&config);
        Self {
            config,
            sessions,
            navigator,
            auth,
            started_at: Instant::now(),
        }
    }

    /// Launch the browser now instead of on first use
    pub async fn warm_up(&self) -> Result<(), EngineError> {
        self.sessions.ensure_ready().await.map(|_| ())
    }

    /// Close the browser session. Subsequent operations relaunch lazily.
    pub async fn close(&self) {
        self.sessions.close().await;
    }

    pub async fn status(&self) -> EngineStatus {
        EngineStatus {
            session: self.sessions.state(),
            auth: self.auth.cached().await,
            uptime_secs: self.started_at.elapsed().as_secs(),
            headless: self.config.headless,
            profile_dir: self.config.browser_data_dir.display().to_string(),
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.sessions.state()
    }

    pub fn browser_ready(&self) -> bool {
        self.sessions.is_ready()
    }

    /// Probe the home surface for login state and cache the result
    pub async fn check_login_status(&self) -> Result<AuthState, EngineError> {
        self.auth.check_status(&self.navigator).await
    }

    /// Poll for a completed manual login; see [`AuthStateMachine`]
    pub async fn wait_for_login(&self, cancel: &CancellationToken) -> Result<bool, EngineError> {
        self.auth.wait_for_login(&self.navigator, cancel).await
    }

    /// Open the search-results surface for `keywords`.
    ///
    /// Requires login: the application redirects anonymous search to a
    /// login wall, so failing fast gives the caller a clearer answer.
    pub(crate) async fn open_search(&self, keywords: &str) -> Result<Page, EngineError> {
        self.auth.require_logged_in(&self.navigator).await?;

        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("keyword", keywords)
            .finish();
        self.navigator.navigate(&format!("{HOME_URL}/search_result?{query}")).await
    }

    /// Search and return deduplicated results, at most `limit`
    pub async fn search_notes(&self, keywords: &str, limit: usize) -> Result<Vec<NoteSummary>, EngineError> {
        let page = self.open_search(keywords).await?;
        Ok(extract::extract_search_results(&page, limit).await)
    }

    /// Extract the note at `url`. Requires login.
    pub async fn get_note(&self, url: &str) -> Result<Note, EngineError> {
        self.auth.require_logged_in(&self.navigator).await?;

        let url = normalize_url(url);
        let page = self.navigator.navigate(&url).await?;
        Ok(extract::extract_note(&page, &url).await)
    }

    /// Extract up to [`MAX_COMMENTS`] comments from the note at `url`
    pub async fn get_comments(&self, url: &str) -> Result<Vec<Comment>, EngineError> {
        let url = normalize_url(url);
        let page = self.navigator.navigate(&url).await?;
        Ok(extract::extract_comments(&page, MAX_COMMENTS).await)
    }

    /// Extract the note at `url` and classify it
    pub async fn analyze_note(&self, url: &str) -> Result<NoteAnalysis, EngineError> {
        let note = self.get_note(url).await?;
        Ok(analysis::analyze(note))
    }

    /// Post `text` as a comment on the note at `url`. Requires login.
    pub async fn post_comment(&self, url: &str, text: &str) -> Result<(), EngineError> {
        interact::post_comment(&self.navigator, &self.auth, url, text).await
    }
}
