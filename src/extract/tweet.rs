//! Tweet and reply record assembly.
//!
//! X's markup keys semantic elements with `data-testid` attributes; those
//! are the stable markers. Each field is read independently so one broken
//! field never takes down the whole record, and a record only dies when its
//! body text cannot be derived at all.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};

use super::fields::{first_attr, first_text, has_match, is_countish, split_name_handle};
use super::types::{ReplyRecord, TweetMetrics, TweetRecord};
use super::{effective_count, TWEET_HARD_CAP};

/// DOM marker for tweet containers on listing and detail pages.
pub const TWEET_MARKER: &str = "article[data-testid='tweet']";

/// All tweet records in a snapshot, in DOM order, capped.
pub fn extract_tweets(html: &str, requested: Option<usize>) -> Vec<TweetRecord> {
    let document = Html::parse_document(html);
    let rows = containers(&document);
    let budget = effective_count(requested, rows.len(), TWEET_HARD_CAP);

    let records: Vec<TweetRecord> = rows
        .into_iter()
        .filter_map(assemble_tweet)
        .take(budget)
        .collect();
    tracing::debug!(count = records.len(), "Assembled tweet records");
    records
}

/// Replies under a detail page: every container after the focal tweet.
pub fn extract_replies(html: &str, requested: Option<usize>) -> Vec<ReplyRecord> {
    let document = Html::parse_document(html);
    let rows = containers(&document);
    let available = rows.len().saturating_sub(1);
    let budget = effective_count(requested, available, TWEET_HARD_CAP);

    let records: Vec<ReplyRecord> = rows
        .into_iter()
        .skip(1)
        .filter_map(assemble_tweet)
        .map(ReplyRecord::from)
        .take(budget)
        .collect();
    tracing::debug!(count = records.len(), "Assembled reply records");
    records
}

/// The focal tweet of a detail page: the first container that assembles.
pub fn extract_detail(html: &str) -> Option<TweetRecord> {
    let document = Html::parse_document(html);
    containers(&document).into_iter().next().and_then(assemble_tweet)
}

/// Tweet containers, preferring the stable testid selector and falling back
/// to bare article elements when X changes its markup.
fn containers(document: &Html) -> Vec<ElementRef<'_>> {
    let primary = Selector::parse(TWEET_MARKER).expect("Invalid tweet selector");
    let fallback = Selector::parse("article").expect("Invalid article selector");

    let mut rows: Vec<_> = document.select(&primary).collect();
    if rows.is_empty() {
        rows = document.select(&fallback).collect();
    }
    rows
}

/// Assemble one record from a located container. Returns `None` only when
/// no body text can be derived; every other field degrades independently.
pub fn assemble_tweet(element: ElementRef<'_>) -> Option<TweetRecord> {
    let text = tweet_text(element)?;
    let (author, handle) = author_parts(element);
    let social = first_text(element, "[data-testid='socialContext']")
        .map(|context| context.to_lowercase());

    Some(TweetRecord {
        author,
        handle,
        text,
        url: status_url(element),
        metrics: metrics(element),
        time: timestamp(element),
        has_media: Some(
            has_match(element, "[data-testid='tweetPhoto']")
                || has_match(element, "[data-testid='videoPlayer']")
                || has_match(element, "video"),
        ),
        is_retweet: Some(social.as_deref().is_some_and(|s| {
            s.contains("repost") || s.contains("retweet")
        })),
        is_pinned: Some(social.as_deref().is_some_and(|s| s.contains("pinned"))),
    })
}

/// Prefer the tweetText testid; fall back to div[lang], which usually holds
/// the rendered text when the testid is missing.
fn tweet_text(element: ElementRef<'_>) -> Option<String> {
    first_text(element, "[data-testid='tweetText']")
        .or_else(|| first_text(element, "div[lang]"))
}

fn author_parts(element: ElementRef<'_>) -> (String, Option<String>) {
    let raw = first_text(element, "[data-testid='User-Name']")
        .or_else(|| first_text(element, "[data-testid='User-Names']"))
        .unwrap_or_default();
    if raw.is_empty() {
        return (String::new(), None);
    }
    split_name_handle(&raw)
}

fn status_url(element: ElementRef<'_>) -> Option<String> {
    let href = first_attr(element, "a[href*='/status/']", "href")?;
    let href = href.split(['?', '#']).next().unwrap_or(&href);
    if href.starts_with('/') {
        Some(format!("https://x.com{href}"))
    } else {
        Some(href.to_string())
    }
}

fn timestamp(element: ElementRef<'_>) -> Option<DateTime<Utc>> {
    let datetime = first_attr(element, "time", "datetime")?;
    DateTime::parse_from_rfc3339(&datetime)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn metrics(element: ElementRef<'_>) -> TweetMetrics {
    TweetMetrics {
        replies: count_of(element, "[data-testid='reply']"),
        reposts: count_of(element, "[data-testid='retweet']"),
        likes: count_of(element, "[data-testid='like']"),
        views: views(element),
    }
}

fn count_of(element: ElementRef<'_>, selector: &str) -> Option<String> {
    first_text(element, selector).filter(|text| is_countish(text))
}

/// Views sit behind the analytics link, or only inside the engagement
/// group's aria-label on some variants.
fn views(element: ElementRef<'_>) -> Option<String> {
    if let Some(text) =
        first_text(element, "a[href$='/analytics']").filter(|text| is_countish(text))
    {
        return Some(text);
    }

    let label = first_attr(element, "div[role='group']", "aria-label")?;
    let pattern = regex::Regex::new(r"(?i)([\d.,]+[KMB]?)\s+views").ok()?;
    pattern
        .captures(&label)
        .map(|captures| captures[1].to_string())
}
