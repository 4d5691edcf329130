//! Navigation with candidate-URL fallback.
//!
//! X frequently A/B-tests its own layout, so a single URL routinely renders
//! none of the expected markers. Each navigation target therefore carries an
//! ordered candidate list; the first candidate whose page contains the DOM
//! marker wins. Navigation waits only for minimal DOM readiness plus a fixed
//! settle delay - the site is a long-polling SPA that never finishes loading
//! in the network-idle sense.

use anyhow::Result;
use scraper::{Html, Selector};
use url::Url;

use crate::config::Config;
use crate::error::Error;
use crate::extract::tweet::TWEET_MARKER;
use crate::session::Session;

/// Where to go and what must be on the page once we are there.
#[derive(Debug, Clone)]
pub struct NavigationTarget {
    /// Candidate URLs in priority order.
    pub candidates: Vec<String>,
    /// Selector confirming the page actually rendered the content.
    pub marker: String,
    /// Minimum matches for a candidate to count as a success.
    pub min_elements: usize,
}

impl NavigationTarget {
    #[must_use]
    pub fn new(candidates: Vec<String>, marker: impl Into<String>) -> Self {
        Self {
            candidates,
            marker: marker.into(),
            min_elements: 1,
        }
    }
}

/// Result of a navigation: the rendered HTML snapshot and how well the
/// marker matched. `element_count == 0` means every candidate came up empty;
/// callers decide whether that is an error or an empty result.
#[derive(Debug)]
pub struct NavigationOutcome {
    pub html: String,
    pub matched_url: String,
    pub element_count: usize,
}

/// Drives the session's page through a [`NavigationTarget`].
#[derive(Clone, Copy)]
pub struct Navigator<'a> {
    config: &'a Config,
}

impl<'a> Navigator<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Try each candidate in order and return on the first marker match.
    ///
    /// A timed-out candidate counts as zero elements and the loop moves on.
    /// Only when every candidate fails outright (transport error, login
    /// redirect) does the whole navigation error.
    pub async fn goto(
        &self,
        session: &Session,
        target: &NavigationTarget,
    ) -> Result<NavigationOutcome> {
        let mut last_outcome: Option<NavigationOutcome> = None;
        let mut last_error: Option<anyhow::Error> = None;

        for url in &target.candidates {
            let url = url.as_str();
            match self.attempt(session, url, &target.marker).await {
                Ok(Some(outcome)) => {
                    if outcome.element_count >= target.min_elements.max(1) {
                        tracing::info!(
                            url = %outcome.matched_url,
                            count = outcome.element_count,
                            "Navigation target matched"
                        );
                        return Ok(outcome);
                    }
                    tracing::debug!(url, "No matching elements, trying next candidate");
                    last_outcome = Some(outcome);
                }
                Ok(None) => {
                    tracing::debug!(url, "Navigation timed out, trying next candidate");
                    last_outcome = Some(NavigationOutcome {
                        html: String::new(),
                        matched_url: url.to_string(),
                        element_count: 0,
                    });
                }
                Err(err) => {
                    tracing::warn!(url, error = %err, "Navigation attempt failed");
                    last_error = Some(err);
                }
            }
        }

        if let Some(outcome) = last_outcome {
            return Ok(outcome);
        }
        Err(last_error
            .unwrap_or_else(|| Error::NavigationTimeout("navigation candidates".to_string()).into()))
    }

    /// Detail-page variant: the marker is mandatory. After the candidate loop
    /// the page is polled up to the element-wait budget; expiry is fatal
    /// because there is nothing meaningful to extract without the container.
    pub async fn goto_required(
        &self,
        session: &Session,
        target: &NavigationTarget,
    ) -> Result<NavigationOutcome> {
        let outcome = self.goto(session, target).await?;
        if outcome.element_count > 0 {
            return Ok(outcome);
        }

        let page = session.page();
        let deadline = tokio::time::Instant::now() + self.config.element_wait;
        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            let html = match tokio::time::timeout(self.config.navigation_timeout, page.content())
                .await
            {
                Ok(Ok(html)) => html,
                Ok(Err(err)) => return Err(err.into()),
                Err(_) => continue,
            };
            let count = count_matches(&html, &target.marker);
            if count > 0 {
                return Ok(NavigationOutcome {
                    html,
                    matched_url: outcome.matched_url.clone(),
                    element_count: count,
                });
            }
        }

        Err(Error::NavigationTimeout(format!("primary container {}", target.marker)).into())
    }

    /// One candidate: navigate, settle, snapshot, count. `Ok(None)` means
    /// the navigation timed out.
    async fn attempt(
        &self,
        session: &Session,
        url: &str,
        marker: &str,
    ) -> Result<Option<NavigationOutcome>> {
        let page = session.page();
        tracing::debug!(url, "Navigating");

        match tokio::time::timeout(self.config.navigation_timeout, page.goto(url)).await {
            Err(_) => return Ok(None),
            Ok(Err(err)) => return Err(anyhow::Error::from(err)),
            Ok(Ok(_)) => {}
        }

        // Let client-side rendering populate the dynamic content.
        tokio::time::sleep(self.config.settle_delay).await;

        let current = page.url().await?.unwrap_or_default();
        if is_login_url(&current) {
            anyhow::bail!("redirected to login - session cookies are invalid or expired");
        }

        let html = match tokio::time::timeout(self.config.navigation_timeout, page.content()).await
        {
            Err(_) => return Ok(None),
            Ok(result) => result?,
        };

        let element_count = count_matches(&html, marker);
        tracing::debug!(url, element_count, "Candidate evaluated");
        Ok(Some(NavigationOutcome {
            html,
            matched_url: url.to_string(),
            element_count,
        }))
    }
}

/// Count marker matches in an HTML snapshot. An unparseable selector counts
/// as zero rather than erroring; markers are part of the navigation contract,
/// not user input.
pub fn count_matches(html: &str, selector: &str) -> usize {
    let Ok(parsed) = Selector::parse(selector) else {
        return 0;
    };
    Html::parse_document(html).select(&parsed).count()
}

/// Whether a URL belongs to the login flow.
pub(crate) fn is_login_url(url: &str) -> bool {
    url.contains("/login") || url.contains("/i/flow/")
}

/// Normalize a tweet reference (full status URL or bare numeric id) into a
/// navigation target for its detail page.
pub fn resolve_tweet_target(reference: &str) -> Result<NavigationTarget, Error> {
    let url = canonical_status_url(reference)?;
    Ok(NavigationTarget::new(vec![url], TWEET_MARKER))
}

fn canonical_status_url(reference: &str) -> Result<String, Error> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidReference("empty tweet reference".to_string()));
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        let parsed = Url::parse(trimmed)
            .map_err(|e| Error::InvalidReference(format!("{trimmed}: {e}")))?;
        let host_ok = parsed.host_str().is_some_and(|host| {
            let host = host
                .trim_start_matches("www.")
                .trim_start_matches("mobile.");
            host == "x.com" || host == "twitter.com"
        });
        if host_ok {
            if let Some((prefix, id)) = parse_status_path(parsed.path()) {
                return Ok(format!("https://x.com/{prefix}/status/{id}"));
            }
        }
        return Err(Error::InvalidReference(trimmed.to_string()));
    }

    if is_tweet_id(trimmed) {
        return Ok(format!("https://x.com/i/status/{trimmed}"));
    }

    Err(Error::InvalidReference(trimmed.to_string()))
}

/// Paths look like `/username/status/1234567890`, occasionally with extra
/// leading segments (`/i/web/status/...`).
fn parse_status_path(path: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .filter(|part| !part.is_empty())
        .collect();
    let idx = parts.iter().position(|part| *part == "status")?;
    let id = parts.get(idx + 1)?;
    if idx == 0 || !is_tweet_id(id) {
        return None;
    }
    Some((parts[..idx].join("/"), (*id).to_string()))
}

/// A plausible numeric tweet id.
fn is_tweet_id(candidate: &str) -> bool {
    candidate.len() >= 5
        && candidate.len() <= 25
        && candidate.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_url_from_full_urls() {
        assert_eq!(
            canonical_status_url("https://x.com/jane/status/123456").unwrap(),
            "https://x.com/jane/status/123456"
        );
        assert_eq!(
            canonical_status_url("https://twitter.com/jane/status/123456?s=20").unwrap(),
            "https://x.com/jane/status/123456"
        );
        assert_eq!(
            canonical_status_url("https://mobile.x.com/i/web/status/9876543").unwrap(),
            "https://x.com/i/web/status/9876543"
        );
    }

    #[test]
    fn test_canonical_url_from_bare_id() {
        assert_eq!(
            canonical_status_url("1234567890").unwrap(),
            "https://x.com/i/status/1234567890"
        );
        assert_eq!(
            canonical_status_url("  1234567890  ").unwrap(),
            "https://x.com/i/status/1234567890"
        );
    }

    #[test]
    fn test_invalid_references_are_rejected() {
        assert!(canonical_status_url("").is_err());
        assert!(canonical_status_url("not a tweet").is_err());
        assert!(canonical_status_url("https://google.com/status/123456").is_err());
        assert!(canonical_status_url("https://x.com/jane/posts/123456").is_err());
        assert!(canonical_status_url("123").is_err());
    }

    #[test]
    fn test_count_matches() {
        let html = "<div><p class='a'>x</p><p class='a'>y</p><p class='b'>z</p></div>";
        assert_eq!(count_matches(html, "p.a"), 2);
        assert_eq!(count_matches(html, "p.c"), 0);
        assert_eq!(count_matches(html, "[[["), 0);
    }

    #[test]
    fn test_login_url_detection() {
        assert!(is_login_url("https://x.com/login"));
        assert!(is_login_url("https://x.com/i/flow/login"));
        assert!(!is_login_url("https://x.com/home"));
    }
}
