//! Scanning of rich-text block content.
//!
//! Text content is HTML-like markup produced by the editor surface. Only a
//! few things are read out of it here: the plain text, headings (see
//! [`crate::outline`]), and the `---` separator marker.

use std::sync::LazyLock;

use regex::Regex;

/// Typing this on its own line turns into a separator block.
pub const SEPARATOR_MARKER: &str = "---";

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static LINE_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:div|p|h[1-6]|blockquote)\b[^>]*>(.*?)</(?:div|p|h[1-6]|blockquote)\s*>")
        .expect("valid regex")
});

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));

/// Strips tags and decodes the common entities.
#[must_use]
pub fn plain_text(markup: &str) -> String {
    TAG.replace_all(markup, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn is_marker(markup: &str) -> bool {
    plain_text(markup).trim() == SEPARATOR_MARKER
}

/// Removes the separator marker from text content.
///
/// Returns the cleaned content, or `None` if no line of the content is
/// exactly `---`. Content that is nothing but the marker becomes empty.
#[must_use]
pub fn strip_separator_marker(content: &str) -> Option<String> {
    if is_marker(content) {
        return Some(String::new());
    }

    if let Some(found) = LINE_ELEMENT
        .captures_iter(content)
        .find(|caps| caps.get(1).is_some_and(|inner| is_marker(inner.as_str())))
        .and_then(|caps| caps.get(0))
    {
        let mut cleaned = String::with_capacity(content.len());
        cleaned.push_str(&content[..found.start()]);
        cleaned.push_str(&content[found.end()..]);
        return Some(cleaned.trim().to_string());
    }

    let segments: Vec<&str> = LINE_BREAK.split(content).collect();
    if segments.len() > 1 {
        if let Some(pos) = segments.iter().position(|s| is_marker(s)) {
            let kept: Vec<&str> = segments
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != pos)
                .map(|(_, s)| *s)
                .collect();
            return Some(kept.join("<br>").trim().to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_strips_tags() {
        assert_eq!(plain_text("<p>Hello&nbsp;<b>you</b> &amp; me</p>"), "Hello you & me");
    }

    #[test]
    fn whole_content_marker_clears() {
        assert_eq!(strip_separator_marker("---").as_deref(), Some(""));
        assert_eq!(strip_separator_marker("  <div>---</div> ").as_deref(), Some(""));
    }

    #[test]
    fn marker_line_element_is_removed() {
        let content = "<p>Intro</p><div>---</div><p>More</p>";
        assert_eq!(
            strip_separator_marker(content).as_deref(),
            Some("<p>Intro</p><p>More</p>")
        );
    }

    #[test]
    fn marker_after_line_break_is_removed() {
        assert_eq!(
            strip_separator_marker("Intro<br>---").as_deref(),
            Some("Intro")
        );
    }

    #[test]
    fn longer_dashes_are_not_a_marker() {
        assert_eq!(strip_separator_marker("----"), None);
        assert_eq!(strip_separator_marker("<p>a --- b</p>"), None);
        assert_eq!(strip_separator_marker(""), None);
    }
}
