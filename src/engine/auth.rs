//! Login-state detection
//!
//! The application exposes no authentication API, so login state is
//! inferred from the DOM: a login affordance on the home surface means
//! logged out, its absence means logged in. This is a documented
//! heuristic, not a contract. The probed state is cached on the session
//! and never invalidated automatically — callers that need freshness
//! re-probe explicitly.

use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::EngineError;
use super::extract::HOME_URL;
use super::navigator::Navigator;
use super::selectors::{self, groups, Resolve};
use crate::config::Config;

/// Re-probe cadence inside the manual-login wait loop
const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Unknown,
    LoggedOut,
    LoggedIn,
}

pub struct AuthStateMachine {
    cached: RwLock<AuthState>,
    probe_timeout: Duration,
    login_timeout: Duration,
}

impl AuthStateMachine {
    pub fn new(config: &Config) -> Self {
        Self {
            cached: RwLock::new(AuthState::Unknown),
            probe_timeout: config.probe_timeout,
            login_timeout: config.login_timeout,
        }
    }

    /// Last probed state, without touching the browser
    pub async fn cached(&self) -> AuthState {
        *self.cached.read().await
    }

    /// Probe the home surface and cache the result.
    ///
    /// Presence of a login affordance ⇒ logged out; absence ⇒ logged in.
    pub async fn check_status(&self, navigator: &Navigator) -> Result<AuthState, EngineError> {
        let page = navigator.navigate(HOME_URL).await?;

        let state = match selectors::resolve_first(&page, &groups::LOGIN_PROMPT, self.probe_timeout).await
        {
            Resolve::Found { selector, .. } => {
                tracing::debug!(selector, "login affordance present");
                AuthState::LoggedOut
            }
            Resolve::NotFound => AuthState::LoggedIn,
        };

        *self.cached.write().await = state;
        Ok(state)
    }

    /// Block until the user finishes logging in by hand, the login budget
    /// elapses, or the caller cancels. Returns whether login was observed.
    ///
    /// Individual probe failures do not abort the wait; the page may be
    /// mid-reload while the user interacts with it.
    pub async fn wait_for_login(
        &self,
        navigator: &Navigator,
        cancel: &CancellationToken,
    ) -> Result<bool, EngineError> {
        let deadline = Instant::now() + self.login_timeout;

        loop {
            if cancel.is_cancelled() {
                return Ok(false);
            }

            match self.check_status(navigator).await {
                Ok(AuthState::LoggedIn) => return Ok(true),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "login probe failed, continuing to wait"),
            }

            if Instant::now() >= deadline {
                return Ok(false);
            }

            tokio::select! {
                () = cancel.cancelled() => return Ok(false),
                () = tokio::time::sleep(LOGIN_POLL_INTERVAL) => {}
            }
        }
    }

    /// Gate an operation on an authenticated session.
    ///
    /// Trusts the cache when it already says logged in (a single logical
    /// operation's worth of freshness); otherwise re-probes once.
    pub async fn require_logged_in(&self, navigator: &Navigator) -> Result<(), EngineError> {
        if self.cached().await == AuthState::LoggedIn {
            return Ok(());
        }
        match self.check_status(navigator).await? {
            AuthState::LoggedIn => Ok(()),
            _ => Err(EngineError::LoginRequired),
        }
    }
}
