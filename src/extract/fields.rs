//! Field-level extraction helpers.
//!
//! Every routine here returns an `Option` and swallows its own failures: a
//! listing of N rows must still produce N-1 good records when one row's
//! markup is malformed. Nothing in this module propagates an error.

use scraper::{ElementRef, Selector};

/// First descendant matching `selector`, if the selector parses and matches.
pub fn select_first<'a>(element: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let parsed = Selector::parse(selector).ok()?;
    element.select(&parsed).next()
}

/// Trimmed text of the first descendant matching `selector`; empty text
/// counts as absent.
pub fn first_text(element: ElementRef<'_>, selector: &str) -> Option<String> {
    let found = select_first(element, selector)?;
    let text = found.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Attribute value of the first descendant matching `selector`.
pub fn first_attr(element: ElementRef<'_>, selector: &str, attr: &str) -> Option<String> {
    select_first(element, selector)?
        .value()
        .attr(attr)
        .map(str::to_string)
}

/// Whether any descendant matches `selector`.
pub fn has_match(element: ElementRef<'_>, selector: &str) -> bool {
    select_first(element, selector).is_some()
}

/// Split a combined "Display Name@handle" string at the first `@`-prefixed
/// token. Without one, the handle is absent and the author is the whole
/// string. The handle stops at the first non-word character, since the
/// source text often runs straight into a separator dot or timestamp.
pub fn split_name_handle(raw: &str) -> (String, Option<String>) {
    let Some(at) = raw.find('@') else {
        return (raw.trim().to_string(), None);
    };

    let handle: String = std::iter::once('@')
        .chain(
            raw[at + 1..]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_'),
        )
        .collect();
    if handle.len() == 1 {
        // A lone '@' with no handle characters after it.
        return (raw.trim().to_string(), None);
    }

    let name = raw[..at].trim().to_string();
    if name.is_empty() {
        // Markup carried only the handle; use it as the display name too.
        return (handle.trim_start_matches('@').to_string(), Some(handle));
    }
    (name, Some(handle))
}

/// Whether a string looks like a rendered engagement count ("12", "1.2K").
pub fn is_countish(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty()
        && trimmed.chars().all(|c| {
            c.is_ascii_digit() || c == '.' || c == ',' || matches!(c, 'K' | 'M' | 'B' | 'k' | 'm')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn fragment(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    #[test]
    fn test_first_text_trims_and_skips_empty() {
        let doc = fragment("<div><span class='a'>  hello </span><span class='b'> </span></div>");
        let root = doc.root_element();
        assert_eq!(first_text(root, "span.a"), Some("hello".to_string()));
        assert_eq!(first_text(root, "span.b"), None);
        assert_eq!(first_text(root, "span.c"), None);
    }

    #[test]
    fn test_bad_selector_degrades_to_absent() {
        let doc = fragment("<div><span>x</span></div>");
        let root = doc.root_element();
        assert_eq!(first_text(root, "[[["), None);
        assert_eq!(first_attr(root, "[[[", "href"), None);
        assert!(!has_match(root, "[[["));
    }

    #[test]
    fn test_split_name_handle() {
        assert_eq!(
            split_name_handle("Jane Doe@janedoe"),
            ("Jane Doe".to_string(), Some("@janedoe".to_string()))
        );
        assert_eq!(
            split_name_handle("Jane Doe"),
            ("Jane Doe".to_string(), None)
        );
    }

    #[test]
    fn test_split_name_handle_stops_at_separator() {
        assert_eq!(
            split_name_handle("Jane Doe@janedoe·3h"),
            ("Jane Doe".to_string(), Some("@janedoe".to_string()))
        );
    }

    #[test]
    fn test_split_name_handle_handle_only() {
        assert_eq!(
            split_name_handle("@janedoe"),
            ("janedoe".to_string(), Some("@janedoe".to_string()))
        );
    }

    #[test]
    fn test_is_countish() {
        assert!(is_countish("12"));
        assert!(is_countish("1.2K"));
        assert!(is_countish("3,400"));
        assert!(!is_countish("Reply"));
        assert!(!is_countish(""));
    }
}
