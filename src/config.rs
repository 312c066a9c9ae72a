//! Process configuration
//!
//! Read once at startup from the environment; everything downstream
//! receives an immutable copy.

use std::path::PathBuf;
use std::time::Duration;

/// Default HTTP port
const DEFAULT_PORT: u16 = 8080;

/// Configuration for the browser engine and HTTP server
#[derive(Debug, Clone)]
pub struct Config {
    /// Run Chrome without a visible window
    pub headless: bool,
    /// Profile directory handed to Chrome so cookies survive restarts
    pub browser_data_dir: PathBuf,
    /// HTTP listen port
    pub port: u16,
    /// Per-navigation page load budget
    pub page_timeout: Duration,
    /// Bounded wait for post-load async rendering to settle
    pub settle_timeout: Duration,
    /// Budget for a single selector probe (login affordance, fields)
    pub probe_timeout: Duration,
    /// Overall budget for the manual-login wait loop
    pub login_timeout: Duration,
    /// Navigation retry attempts for transient load failures
    pub max_retry_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            headless: true,
            browser_data_dir: PathBuf::from("./browser_data"),
            port: DEFAULT_PORT,
            page_timeout: Duration::from_secs(30),
            settle_timeout: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(3),
            login_timeout: Duration::from_secs(120),
            max_retry_attempts: 3,
        }
    }
}

impl Config {
    /// Build configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("HEADLESS_MODE") {
            config.headless = v.to_lowercase() != "false";
        }
        if let Ok(v) = std::env::var("BROWSER_DATA_DIR") {
            config.browser_data_dir = PathBuf::from(v);
        }
        if let Some(port) = std::env::var("REDNOTE_PORT").ok().and_then(|p| p.parse().ok()) {
            config.port = port;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_budgets() {
        let config = Config::default();
        assert!(config.headless);
        assert_eq!(config.max_retry_attempts, 3);
        assert_eq!(config.page_timeout, Duration::from_secs(30));
        assert_eq!(config.login_timeout, Duration::from_secs(120));
    }
}
