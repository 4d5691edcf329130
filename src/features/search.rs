//! Tweet-search capability.

use anyhow::Result;
use serde::Deserialize;

use crate::config::Config;
use crate::error::Error;
use crate::extract::tweet::{self, TWEET_MARKER};
use crate::extract::types::TweetRecord;
use crate::harness::Envelope;
use crate::nav::{NavigationTarget, Navigator};
use crate::session::with_session;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub tab: Option<String>,
}

pub async fn run(config: &Config, request: SearchRequest) -> Result<Envelope<Vec<TweetRecord>>> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(Error::InvalidReference("search query is empty".to_string()).into());
    }

    let candidates = search_candidates(query, request.tab.as_deref());
    let outcome = with_session(config, |session| async move {
        let target = NavigationTarget::new(candidates, TWEET_MARKER);
        Navigator::new(config).goto(&session, &target).await
    })
    .await?;

    if outcome.element_count == 0 {
        return Ok(Envelope::success(format!("No results for \"{query}\""), None));
    }

    let records = tweet::extract_tweets(&outcome.html, request.count);
    if records.is_empty() {
        return Ok(Envelope::success(format!("No results for \"{query}\""), None));
    }

    let message = format!("Found {} tweets for \"{query}\"", records.len());
    Ok(Envelope::success(message, Some(records)))
}

/// The tab-specific URL first, then the default results page as fallback.
fn search_candidates(query: &str, tab: Option<&str>) -> Vec<String> {
    let encoded = urlencoding::encode(query);
    let mut candidates = Vec::new();
    if let Some(filter) = tab_param(tab) {
        candidates.push(format!(
            "https://x.com/search?q={encoded}&src=typed_query&f={filter}"
        ));
    }
    candidates.push(format!("https://x.com/search?q={encoded}&src=typed_query"));
    candidates
}

/// Result-tab names accepted in requests, mapped to the `f` query
/// parameter. "top" and anything unknown use the default results page.
fn tab_param(tab: Option<&str>) -> Option<&'static str> {
    let tab = tab?.to_ascii_lowercase();
    match tab.as_str() {
        "latest" | "live" => Some("live"),
        "people" | "user" => Some("user"),
        "media" => Some("media"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_config() -> Config {
        Config {
            browser_executable: PathBuf::from("/nonexistent/browser"),
            profile_dir: PathBuf::from("/nonexistent/profile"),
            auth_marker_path: PathBuf::from("/nonexistent/auth.json"),
            navigation_timeout: std::time::Duration::from_secs(1),
            settle_delay: std::time::Duration::from_millis(1),
            element_wait: std::time::Duration::from_secs(1),
            viewport: (1280, 1024),
            launch_args: Vec::new(),
            headless: true,
            debug_port: 9223,
        }
    }

    #[tokio::test]
    async fn test_empty_query_fails_before_any_navigation() {
        let request = SearchRequest {
            query: "   ".to_string(),
            count: None,
            tab: None,
        };

        let err = run(&test_config(), request).await.unwrap_err();
        // An invalid reference, not a launch failure: the session was never
        // opened.
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidReference(_))
        ));
    }

    #[test]
    fn test_candidates_prioritize_the_requested_tab() {
        let candidates = search_candidates("rust lang", Some("latest"));
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].contains("f=live"));
        assert!(candidates[0].contains("q=rust%20lang"));
        assert!(!candidates[1].contains("f="));
    }

    #[test]
    fn test_top_tab_uses_default_page_only() {
        assert_eq!(search_candidates("x", Some("top")).len(), 1);
        assert_eq!(search_candidates("x", None).len(), 1);
    }
}
