//! User-timeline capability.

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
pub struct UserPostsRequest {
    pub username: String,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub tab: Option<String>,
}

pub async fn run(config: &Config, request: UserPostsRequest) -> Result<Envelope<Vec<TweetRecord>>> {
    let username = request.username.trim().trim_start_matches('@').to_string();
    if username.is_empty() {
        return Err(Error::InvalidReference("username is empty".to_string()).into());
    }

    let candidates = timeline_candidates(&username, request.tab.as_deref());
    let outcome = with_session(config, |session| async move {
        let target = NavigationTarget::new(candidates, TWEET_MARKER);
        Navigator::new(config).goto(&session, &target).await
    })
    .await?;

    if outcome.element_count == 0 {
        return Ok(Envelope::success(
            format!("No posts found for @{username}"),
            None,
        ));
    }

    let records = tweet::extract_tweets(&outcome.html, request.count);
    if records.is_empty() {
        return Ok(Envelope::success(
            format!("No posts found for @{username}"),
            None,
        ));
    }

    let message = format!("Found {} posts from @{username}", records.len());
    Ok(Envelope::success(message, Some(records)))
}

/// The requested tab first, the plain profile as fallback.
fn timeline_candidates(username: &str, tab: Option<&str>) -> Vec<String> {
    let profile = format!("https://x.com/{username}");
    let with_replies = tab
        .map(str::to_ascii_lowercase)
        .is_some_and(|tab| tab == "replies" || tab == "with_replies");

    if with_replies {
        vec![format!("{profile}/with_replies"), profile]
    } else {
        vec![profile]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_candidates() {
        assert_eq!(
            timeline_candidates("jane", None),
            vec!["https://x.com/jane".to_string()]
        );
        assert_eq!(
            timeline_candidates("jane", Some("replies")),
            vec![
                "https://x.com/jane/with_replies".to_string(),
                "https://x.com/jane".to_string()
            ]
        );
    }
}
