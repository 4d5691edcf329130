//! Extracted record value objects.
//!
//! Optional fields mean "not found in the markup", never "zero". A record's
//! primary field (tweet text, trend topic) is the one exception: rows
//! without it are dropped during assembly instead of emitted empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One trending-topic row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendRecord {
    /// Position in the listing, 1-based, derived from DOM order.
    pub rank: usize,
    /// The trending topic or hashtag.
    pub topic: String,
    /// Category label, e.g. "Technology".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Post volume as displayed, e.g. "120K posts".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_count: Option<String>,
}

/// Engagement counts as the page displays them ("1.2K"), kept as strings so
/// an absent count stays distinguishable from a zero one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reposts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<String>,
}

impl TweetMetrics {
    /// True when no count was found at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.replies.is_none()
            && self.reposts.is_none()
            && self.likes.is_none()
            && self.views.is_none()
    }
}

/// One tweet from a listing or detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetRecord {
    /// Display name of the author.
    pub author: String,
    /// Handle with the `@` prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Tweet body text.
    pub text: String,
    /// Canonical status URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Engagement counts.
    #[serde(default, skip_serializing_if = "TweetMetrics::is_empty")]
    pub metrics: TweetMetrics,
    /// When the tweet was posted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    /// Whether the tweet carries photo or video media.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_media: Option<bool>,
    /// Whether the row is a repost into this timeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_retweet: Option<bool>,
    /// Whether the row is pinned to the profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

/// One reply under a tweet detail page. Replies carry no own URL or
/// timeline flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "TweetMetrics::is_empty")]
    pub metrics: TweetMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
}

impl From<TweetRecord> for ReplyRecord {
    fn from(tweet: TweetRecord) -> Self {
        Self {
            author: tweet.author,
            handle: tweet.handle,
            text: tweet.text,
            metrics: tweet.metrics,
            time: tweet.time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_are_skipped_in_json() {
        let record = TweetRecord {
            author: "Jane".to_string(),
            handle: None,
            text: "hello".to_string(),
            url: None,
            metrics: TweetMetrics::default(),
            time: None,
            has_media: None,
            is_retweet: None,
            is_pinned: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.keys().count(), 2);
        assert!(object.contains_key("author"));
        assert!(object.contains_key("text"));
    }

    #[test]
    fn test_metrics_emptiness() {
        assert!(TweetMetrics::default().is_empty());
        let metrics = TweetMetrics {
            likes: Some("3".to_string()),
            ..TweetMetrics::default()
        };
        assert!(!metrics.is_empty());
    }
}
