//! Trend row extraction.
//!
//! Trend cells carry no semantic tagging for their three text roles
//! (category, topic, post volume); the roles are inferred purely from text
//! shape. The longest-remaining-line topic fallback is a documented last
//! resort, not a contract.

use scraper::{ElementRef, Html, Selector};

use super::types::TrendRecord;
use super::{effective_count, TREND_HARD_CAP};

/// DOM marker for trend cells.
pub const TREND_MARKER: &str = "[data-testid='trend']";

/// All trend records in a snapshot, ranked by DOM order, capped.
pub fn extract_trends(html: &str, requested: Option<usize>) -> Vec<TrendRecord> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(TREND_MARKER).expect("Invalid trend selector");
    let rows: Vec<_> = document.select(&selector).collect();
    let budget = effective_count(requested, rows.len(), TREND_HARD_CAP);

    let records: Vec<TrendRecord> = rows
        .into_iter()
        .filter_map(assemble_trend)
        .take(budget)
        .enumerate()
        .map(|(index, mut record)| {
            record.rank = index + 1;
            record
        })
        .collect();
    tracing::debug!(count = records.len(), "Assembled trend records");
    records
}

/// Assemble one trend record; rows with no derivable topic are dropped.
fn assemble_trend(element: ElementRef<'_>) -> Option<TrendRecord> {
    let lines: Vec<String> = element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect();

    let parts = classify_trend_lines(&lines);
    let topic = parts.topic?;
    Some(TrendRecord {
        rank: 0, // assigned from emit order by the caller
        topic,
        category: parts.category,
        post_count: parts.post_count,
    })
}

/// Classified roles of a trend cell's text lines.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TrendLines {
    pub topic: Option<String>,
    pub category: Option<String>,
    pub post_count: Option<String>,
}

enum LineClass {
    Category(Option<String>),
    PostCount,
    Other,
}

/// Classify raw cell lines by shape: a "<category> · Trending" line yields
/// the category, a "<number><unit> posts" line the post volume, and the
/// first remaining word-start line the topic. When no line matches the
/// topic pattern, fall back to the longest line that is neither category-
/// nor count-shaped.
pub fn classify_trend_lines<S: AsRef<str>>(raw_lines: &[S]) -> TrendLines {
    let mut category = None;
    let mut post_count = None;
    let mut remaining: Vec<&str> = Vec::new();

    for raw in raw_lines {
        let line = raw.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        match classify_line(line) {
            LineClass::Category(value) => {
                if category.is_none() {
                    category = value;
                }
            }
            LineClass::PostCount => {
                if post_count.is_none() {
                    post_count = Some(line.to_string());
                }
            }
            LineClass::Other => remaining.push(line),
        }
    }

    let topic = remaining
        .iter()
        .find(|line| topic_shaped(line))
        .copied()
        .or_else(|| {
            remaining
                .iter()
                .copied()
                .max_by_key(|line| line.chars().count())
        })
        .map(str::to_string);

    TrendLines {
        topic,
        category,
        post_count,
    }
}

fn classify_line(line: &str) -> LineClass {
    if let Some(rest) = line.strip_suffix("Trending") {
        let rest = rest.trim_end();
        if rest.is_empty() {
            return LineClass::Category(None);
        }
        if let Some(category) = rest.strip_suffix('·') {
            let category = category.trim();
            if !category.is_empty() {
                return LineClass::Category(Some(category.to_string()));
            }
            return LineClass::Category(None);
        }
    }
    if let Some(place) = line.strip_prefix("Trending in ") {
        let place = place.trim();
        if !place.is_empty() {
            return LineClass::Category(Some(place.to_string()));
        }
        return LineClass::Category(None);
    }
    if is_post_count(line) {
        return LineClass::PostCount;
    }
    LineClass::Other
}

fn is_post_count(line: &str) -> bool {
    regex::Regex::new(r"(?i)^[\d.,]+\s*[KMB]?\s+posts$")
        .map(|pattern| pattern.is_match(line))
        .unwrap_or(false)
}

fn topic_shaped(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|c| c == '#' || c == '@' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_of_a_full_cell() {
        let parts =
            classify_trend_lines(&["Technology · Trending", "#GPT5", "120K posts"]);
        assert_eq!(parts.category.as_deref(), Some("Technology"));
        assert_eq!(parts.topic.as_deref(), Some("#GPT5"));
        assert_eq!(parts.post_count.as_deref(), Some("120K posts"));
    }

    #[test]
    fn test_trending_in_variant() {
        let parts = classify_trend_lines(&["Trending in United States", "OpenAI"]);
        assert_eq!(parts.category.as_deref(), Some("United States"));
        assert_eq!(parts.topic.as_deref(), Some("OpenAI"));
        assert_eq!(parts.post_count, None);
    }

    #[test]
    fn test_bare_trending_line_is_consumed_without_category() {
        let parts = classify_trend_lines(&["Trending", "#rustlang", "3,401 posts"]);
        assert_eq!(parts.category, None);
        assert_eq!(parts.topic.as_deref(), Some("#rustlang"));
        assert_eq!(parts.post_count.as_deref(), Some("3,401 posts"));
    }

    #[test]
    fn test_topic_falls_back_to_longest_remaining_line() {
        // Neither line starts word-like; the longer one wins.
        let parts = classify_trend_lines(&["Sports · Trending", "·short", "·a longer strange line"]);
        assert_eq!(parts.topic.as_deref(), Some("·a longer strange line"));
    }

    #[test]
    fn test_cell_without_topic_yields_none() {
        let parts = classify_trend_lines(&["Technology · Trending", "120K posts"]);
        assert_eq!(parts.topic, None);
    }

    #[test]
    fn test_extract_trends_ranks_and_drops() {
        let html = "\
            <div data-testid='trend'>\
              <span>Technology · Trending</span><span>#GPT5</span><span>120K posts</span>\
            </div>\
            <div data-testid='trend'><span>Sports · Trending</span><span>12K posts</span></div>\
            <div data-testid='trend'><span>#rustlang</span></div>";

        let records = extract_trends(html, None);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rank, 1);
        assert_eq!(records[0].topic, "#GPT5");
        assert_eq!(records[0].category.as_deref(), Some("Technology"));
        assert_eq!(records[0].post_count.as_deref(), Some("120K posts"));
        assert_eq!(records[1].rank, 2);
        assert_eq!(records[1].topic, "#rustlang");
    }

    #[test]
    fn test_extract_trends_honors_requested_count() {
        let html: String = (0..6)
            .map(|i| format!("<div data-testid='trend'><span>topic{i}</span></div>"))
            .collect();
        assert_eq!(extract_trends(&html, Some(3)).len(), 3);
    }
}
