//! Auth marker persistence and the interactive login flow.
//!
//! The login itself is human-in-the-loop: the browser opens against the
//! persistent profile and the operator completes the flow. All this module
//! records is that it happened, and when.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::config::Config;
use crate::nav::is_login_url;
use crate::session::Session;

/// Ceiling for the headless tunnel-login wait.
const LOGIN_WAIT: Duration = Duration::from_secs(300);

/// Records when an interactive login last succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthMarker {
    /// When the login completed.
    pub logged_in_at: DateTime<Utc>,
    /// When the session was last confirmed working.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_validated: Option<DateTime<Utc>>,
}

impl AuthMarker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            logged_in_at: Utc::now(),
            last_validated: None,
        }
    }

    /// Load the marker from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let marker: Self = serde_json::from_str(&content)?;
        Ok(marker)
    }

    /// Save the marker to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Mark the session as validated.
    pub fn mark_validated(&mut self) {
        self.last_validated = Some(Utc::now());
    }
}

impl Default for AuthMarker {
    fn default() -> Self {
        Self::new()
    }
}

/// Interactive login into the persistent profile.
///
/// With a display the browser opens a window and we wait for the operator to
/// press Enter. Without one the launch exposes the remote-debugging port so
/// the login can be driven through a tunnel, and we poll until the page
/// leaves the login flow.
pub async fn login(config: &Config) -> Result<AuthMarker> {
    let session = Session::open(config).await?;
    let outcome = run_login(config, &session).await;
    let close_result = session.close().await;

    let marker = outcome?;
    close_result?;

    marker
        .save(&config.auth_marker_path)
        .context("failed to write auth marker")?;
    tracing::info!(path = %config.auth_marker_path.display(), "Recorded login");
    Ok(marker)
}

async fn run_login(config: &Config, session: &Session) -> Result<AuthMarker> {
    let page = session.page();
    page.goto("https://x.com/login").await?;

    if config.headless {
        eprintln!(
            "Headless login: attach a browser to 127.0.0.1:{} (e.g. through an SSH tunnel) and complete the login there.",
            config.debug_port
        );
        let deadline = tokio::time::Instant::now() + LOGIN_WAIT;
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            let url = page.url().await?.unwrap_or_default();
            if !is_login_url(&url) {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("login was not completed within the wait budget");
            }
        }
    } else {
        eprintln!("\nPlease log in to X in the browser window.");
        eprintln!("Press Enter when you're done...\n");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
    }

    // A logged-in profile lands on the home timeline instead of bouncing
    // back into the flow.
    page.goto("https://x.com/home").await?;
    tokio::time::sleep(config.settle_delay).await;
    let url = page.url().await?.unwrap_or_default();
    if is_login_url(&url) {
        anyhow::bail!("still redirected to the login flow - login did not complete");
    }

    Ok(AuthMarker::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("auth.json");

        let mut marker = AuthMarker::new();
        marker.mark_validated();
        marker.save(&path).unwrap();

        let loaded = AuthMarker::load(&path).unwrap();
        assert_eq!(loaded.logged_in_at, marker.logged_in_at);
        assert_eq!(loaded.last_validated, marker.last_validated);
    }

    #[test]
    fn test_marker_without_validation_skips_field() {
        let marker = AuthMarker::new();
        let json = serde_json::to_string(&marker).unwrap();
        assert!(!json.contains("last_validated"));
    }
}
