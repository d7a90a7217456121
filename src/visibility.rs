use crate::model::{Post, PostStatus};

/// Who is looking. Authentication itself happens outside this crate;
/// the pipeline only receives the resulting binary state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    Authenticated,
}

/// Pure predicate handed to the storage layer. Building one has no side
/// effects; the store decides how to evaluate it.
#[derive(Debug, Clone, PartialEq)]
pub struct PostFilter {
    pub min_status: PostStatus,
    /// Inclusive ceiling on `published_at`; None disables time gating.
    pub published_before: Option<i64>,
    pub lang: Option<String>,
    pub slug: Option<String>,
    pub author_id: Option<i64>,
}

impl PostFilter {
    /// Filter for every listing context: published, already past its
    /// publication time, and in the requested locale.
    pub fn listing(lang: &str, now: i64) -> PostFilter {
        PostFilter {
            min_status: PostStatus::Published,
            published_before: Some(now),
            lang: Some(lang.to_string()),
            slug: None,
            author_id: None,
        }
    }

    /// Filter for the single-post view. An authenticated viewer sees any
    /// status at any time (preview access); an anonymous viewer also gets
    /// pending posts, but only by direct link and only once the
    /// publication time has passed. The locale is never restricted here:
    /// the located post's own `lang` becomes the active locale.
    pub fn detail(viewer: Viewer, slug: &str, now: i64) -> PostFilter {
        let (min_status, published_before) = match viewer {
            Viewer::Authenticated => (PostStatus::Draft, None),
            Viewer::Anonymous => (PostStatus::Pending, Some(now)),
        };

        PostFilter {
            min_status,
            published_before,
            lang: None,
            slug: Some(slug.to_string()),
            author_id: None,
        }
    }

    pub fn with_author(mut self, author_id: i64) -> PostFilter {
        self.author_id = Some(author_id);
        self
    }

    /// In-memory evaluation of the predicate, used by stores that hold
    /// rows in process rather than translating the filter to SQL.
    pub fn matches(&self, post: &Post) -> bool {
        if post.status < self.min_status {
            return false;
        }
        if let Some(ceiling) = self.published_before {
            if post.published_at > ceiling {
                return false;
            }
        }
        if let Some(ref lang) = self.lang {
            if post.lang != *lang {
                return false;
            }
        }
        if let Some(ref slug) = self.slug {
            if post.slug != *slug {
                return false;
            }
        }
        if let Some(author_id) = self.author_id {
            if post.author_id != author_id {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(status: PostStatus, published_at: i64, lang: &str) -> Post {
        Post {
            id: 1,
            title: "Title".to_string(),
            slug: "title".to_string(),
            intro: None,
            content: "Body".to_string(),
            markdown: false,
            status,
            published_at,
            lang: lang.to_string(),
            cover_photo: None,
            cover_thumbnail: None,
            cover_mobile: None,
            author_id: 1,
        }
    }

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_listing_requires_published_past_and_locale() {
        let filter = PostFilter::listing("pl", NOW);

        assert!(filter.matches(&post(PostStatus::Published, NOW - 10, "pl")));
        assert!(filter.matches(&post(PostStatus::Published, NOW, "pl")));
        assert!(!filter.matches(&post(PostStatus::Pending, NOW - 10, "pl")));
        assert!(!filter.matches(&post(PostStatus::Draft, NOW - 10, "pl")));
        assert!(!filter.matches(&post(PostStatus::Published, NOW + 1, "pl")));
        assert!(!filter.matches(&post(PostStatus::Published, NOW - 10, "en")));
    }

    #[test]
    fn test_detail_anonymous_accepts_pending_by_direct_link() {
        let filter = PostFilter::detail(Viewer::Anonymous, "title", NOW);

        assert!(filter.matches(&post(PostStatus::Pending, NOW - 10, "pl")));
        assert!(filter.matches(&post(PostStatus::Published, NOW - 10, "en")));
        assert!(!filter.matches(&post(PostStatus::Draft, NOW - 10, "pl")));
        assert!(!filter.matches(&post(PostStatus::Pending, NOW + 5, "pl")));
    }

    #[test]
    fn test_detail_authenticated_sees_everything_matching_the_slug() {
        let filter = PostFilter::detail(Viewer::Authenticated, "title", NOW);

        assert!(filter.matches(&post(PostStatus::Draft, NOW + 1000, "en")));

        let mut other = post(PostStatus::Published, NOW - 10, "pl");
        other.slug = "other".to_string();
        assert!(!filter.matches(&other));
    }

    #[test]
    fn test_author_restriction() {
        let filter = PostFilter::listing("pl", NOW).with_author(7);
        let mine = post(PostStatus::Published, NOW - 10, "pl");
        assert!(!filter.matches(&mine));

        let mut theirs = mine.clone();
        theirs.author_id = 7;
        assert!(filter.matches(&theirs));
    }
}
