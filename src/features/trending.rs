//! Trending-topics capability.

use anyhow::Result;
use serde::Deserialize;

use crate::config::Config;
use crate::extract::trend::{self, TREND_MARKER};
use crate::extract::types::TrendRecord;
use crate::harness::Envelope;
use crate::nav::{NavigationTarget, Navigator};
use crate::session::with_session;

/// Discovery surfaces in priority order. The trending tab is the richest;
/// the explore page and the home "what's happening" panel pick up the slack
/// when a layout experiment hides it.
const SURFACES: &[&str] = &[
    "https://x.com/explore/tabs/trending",
    "https://x.com/explore",
    "https://x.com/home",
];

#[derive(Debug, Default, Deserialize)]
pub struct TrendingRequest {
    #[serde(default)]
    pub count: Option<usize>,
}

pub async fn run(config: &Config, request: TrendingRequest) -> Result<Envelope<Vec<TrendRecord>>> {
    let outcome = with_session(config, |session| async move {
        let target = NavigationTarget::new(
            SURFACES.iter().map(|url| (*url).to_string()).collect(),
            TREND_MARKER,
        );
        Navigator::new(config).goto(&session, &target).await
    })
    .await?;

    if outcome.element_count == 0 {
        return Ok(Envelope::success(
            "No trending topics found on any discovery surface",
            None,
        ));
    }

    let records = trend::extract_trends(&outcome.html, request.count);
    if records.is_empty() {
        return Ok(Envelope::success(
            "Trend cells were present but none yielded a topic",
            None,
        ));
    }

    let message = format!("Found {} trending topics", records.len());
    Ok(Envelope::success(message, Some(records)))
}
