//! Tweet-replies capability.

use anyhow::Result;
use serde::Deserialize;

use crate::config::Config;
use crate::extract::tweet;
use crate::extract::types::ReplyRecord;
use crate::harness::Envelope;
use crate::nav::{resolve_tweet_target, Navigator};
use crate::session::with_session;

#[derive(Debug, Deserialize)]
pub struct ReadRepliesRequest {
    /// Full status URL or bare numeric id.
    #[serde(alias = "tweetUrl", alias = "url", alias = "id")]
    pub tweet: String,
    #[serde(default)]
    pub count: Option<usize>,
}

pub async fn run(config: &Config, request: ReadRepliesRequest) -> Result<Envelope<Vec<ReplyRecord>>> {
    let target = resolve_tweet_target(&request.tweet)?;

    let outcome = with_session(config, |session| async move {
        Navigator::new(config).goto_required(&session, &target).await
    })
    .await?;

    let records = tweet::extract_replies(&outcome.html, request.count);
    if records.is_empty() {
        return Ok(Envelope::success("No replies found", None));
    }

    let message = format!("Found {} replies", records.len());
    Ok(Envelope::success(message, Some(records)))
}
