//! Single-tweet detail capability.

use anyhow::Result;
use serde::Deserialize;

use crate::config::Config;
use crate::extract::tweet;
use crate::extract::types::TweetRecord;
use crate::harness::Envelope;
use crate::nav::{resolve_tweet_target, Navigator};
use crate::session::with_session;

#[derive(Debug, Deserialize)]
pub struct ReadTweetRequest {
    /// Full status URL or bare numeric id.
    #[serde(alias = "tweetUrl", alias = "url", alias = "id")]
    pub tweet: String,
}

pub async fn run(config: &Config, request: ReadTweetRequest) -> Result<Envelope<TweetRecord>> {
    let target = resolve_tweet_target(&request.tweet)?;

    // The detail container is mandatory: a timeout here is fatal, unlike the
    // listing flows.
    let outcome = with_session(config, |session| async move {
        Navigator::new(config).goto_required(&session, &target).await
    })
    .await?;

    match tweet::extract_detail(&outcome.html) {
        Some(record) => {
            let message = match record.handle.as_deref() {
                Some(handle) => format!("Tweet by {} ({handle})", record.author),
                None => format!("Tweet by {}", record.author),
            };
            Ok(Envelope::success(message, Some(record)))
        }
        None => Ok(Envelope::failure(
            "The tweet page loaded but no content could be extracted",
            None,
        )),
    }
}
