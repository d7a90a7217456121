use percent_encoding::percent_decode_str;

use crate::model::PostStatus;
use crate::store::DateOrder;
use crate::text_utils::{html_escape, strip_tags};
use crate::visibility::PostFilter;

/// A free-text search phrase. The sanitized form is used both for
/// substring matching and for safe redisplay in headers and links.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPhrase {
    pub raw: String,
    pub sanitized: String,
}

impl SearchPhrase {
    /// Sanitization never rejects input; whatever comes in degrades to a
    /// safe string. Order matters: decode first, then strip markup, then
    /// encode what is left for embedding.
    pub fn parse(raw: &str) -> SearchPhrase {
        let decoded = percent_decode_str(&raw.replace('+', " "))
            .decode_utf8()
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string());

        let sanitized = html_escape(strip_tags(&decoded).trim());

        SearchPhrase {
            raw: raw.to_string(),
            sanitized,
        }
    }
}

/// The router used to hand over phrases with a trailing `/<page>` still
/// attached. Split it off here; anything non-numeric stays part of the
/// phrase and the page defaults to 1.
pub fn split_page_suffix(input: &str) -> (&str, u32) {
    if let Some((phrase, suffix)) = input.rsplit_once('/') {
        if let Ok(page) = suffix.parse::<u32>() {
            return (phrase, page);
        }
    }
    (input, 1)
}

/// Filter and ordering for a search request.
///
/// The historical behavior skips the publish-time gate and sorts oldest
/// first, unlike every other listing. Both are kept by default so
/// existing result pages stay stable; `strict` switches to the regular
/// listing rules.
pub fn plan(lang: &str, now: i64, strict: bool) -> (PostFilter, DateOrder) {
    if strict {
        (PostFilter::listing(lang, now), DateOrder::Newest)
    } else {
        let filter = PostFilter {
            min_status: PostStatus::Published,
            published_before: None,
            lang: Some(lang.to_string()),
            slug: None,
            author_id: None,
        };
        (filter, DateOrder::Oldest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_markup_and_encodes() {
        let phrase = SearchPhrase::parse("%3Cb%3Ecaf%C3%A9%3C%2Fb%3E test");
        assert_eq!(phrase.sanitized, "café test");

        let phrase = SearchPhrase::parse("<b>café</b> & \"more\"");
        assert_eq!(phrase.sanitized, "café &amp; &quot;more&quot;");
    }

    #[test]
    fn test_sanitize_keeps_broken_input() {
        // invalid percent escape: kept as-is rather than rejected
        let phrase = SearchPhrase::parse("ab%ffcd");
        assert_eq!(phrase.raw, "ab%ffcd");
        assert!(!phrase.sanitized.is_empty());
    }

    #[test]
    fn test_plus_decodes_to_space() {
        let phrase = SearchPhrase::parse("hello+world");
        assert_eq!(phrase.sanitized, "hello world");
    }

    #[test]
    fn test_split_page_suffix() {
        assert_eq!(split_page_suffix("kuchnia/2"), ("kuchnia", 2));
        assert_eq!(split_page_suffix("kuchnia"), ("kuchnia", 1));
        assert_eq!(split_page_suffix("kuchnia/stara"), ("kuchnia/stara", 1));
        assert_eq!(split_page_suffix("a/b/3"), ("a/b", 3));
    }

    #[test]
    fn test_default_plan_keeps_legacy_quirks() {
        let (filter, order) = plan("pl", 1_700_000_000, false);
        assert_eq!(filter.published_before, None);
        assert_eq!(filter.min_status, PostStatus::Published);
        assert_eq!(filter.lang.as_deref(), Some("pl"));
        assert_eq!(order, DateOrder::Oldest);
    }

    #[test]
    fn test_strict_plan_matches_other_listings() {
        let (filter, order) = plan("pl", 1_700_000_000, true);
        assert_eq!(filter.published_before, Some(1_700_000_000));
        assert_eq!(order, DateOrder::Newest);
    }
}
