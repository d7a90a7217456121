use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref PLACEHOLDER_REGEX: Regex = Regex::new(r"\{[^{}]*\}").unwrap();
    static ref NUMERIC_ENTITY_REGEX: Regex = Regex::new(r"&#(x?[0-9a-fA-F]+);").unwrap();
}

/// Removes every HTML/XML tag, keeping the text between them.
pub fn strip_tags(text: &str) -> String {
    TAG_REGEX.replace_all(text, "").to_string()
}

/// Removes `{...}` template placeholders left in stored content.
pub fn strip_placeholders(text: &str) -> String {
    PLACEHOLDER_REGEX.replace_all(text, "").to_string()
}

/// Escapes the characters that are unsafe inside HTML text or
/// attribute values.
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Resolves the common named entities and any numeric entity back to
/// plain characters. Unknown named entities are left as-is.
pub fn decode_entities(text: &str) -> String {
    let named = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ");

    let decoded = NUMERIC_ENTITY_REGEX.replace_all(&named, |caps: &regex::Captures| {
        let code = caps.get(1).unwrap().as_str();
        let value = if let Some(hex) = code.strip_prefix('x') {
            u32::from_str_radix(hex, 16)
        } else {
            code.parse::<u32>()
        };
        match value.ok().and_then(char::from_u32) {
            Some(ch) => ch.to_string(),
            None => caps.get(0).unwrap().as_str().to_string(),
        }
    });

    // &amp; last, so that double-encoded input is not decoded twice
    decoded.replace("&amp;", "&")
}

/// First `max_chars` characters of the text. Counts characters, not
/// bytes, so multi-byte text is never cut in the middle of a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

/// Shortens the text to at most `max_chars` characters, appending the
/// marker when anything was cut off. The marker counts against the
/// budget, so the result never exceeds `max_chars`. Whitespace around
/// the cut point is trimmed first.
pub fn ellipsize(text: &str, max_chars: usize, marker: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let keep = max_chars.saturating_sub(marker.chars().count());
    let mut cut = truncate_chars(trimmed, keep).trim_end().to_string();
    cut.push_str(marker);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>bold</b> and <a href=\"x\">link</a>"), "bold and link");
        assert_eq!(strip_tags("plain text"), "plain text");
        assert_eq!(strip_tags("<img src=\"a.jpg\">"), "");
    }

    #[test]
    fn test_strip_placeholders() {
        assert_eq!(strip_placeholders("before {$module.widget} after"), "before  after");
        assert_eq!(strip_placeholders("{a}{b}text"), "text");
        assert_eq!(strip_placeholders("no placeholders"), "no placeholders");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape(r#"<a href="x">'&'</a>"#),
                   "&lt;a href=&quot;x&quot;&gt;&#039;&amp;&#039;&lt;/a&gt;");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("caf&#233; &amp; tea"), "café & tea");
        assert_eq!(decode_entities("&lt;b&gt;x&lt;/b&gt;"), "<b>x</b>");
        assert_eq!(decode_entities("&#x41;&nbsp;B"), "A B");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("zażółć", 3), "zaż");
        assert_eq!(truncate_chars("short", 500), "short");
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("abcdefgh", 5, "..."), "ab...");
        assert_eq!(ellipsize("abc", 5, "..."), "abc");
        assert_eq!(ellipsize("  padded  ", 20, "..."), "padded");
        // cut point lands right after a space
        assert_eq!(ellipsize("abc defg", 6, "..."), "abc...");
    }

    #[test]
    fn test_ellipsize_marker_counts_against_the_budget() {
        let cut = ellipsize(&"x".repeat(200), 155, "...");
        assert_eq!(cut.chars().count(), 155);
        assert!(cut.ends_with("..."));
    }
}
