use crate::assembler::PostCard;
use crate::deferred::Deferred;
use crate::paginator::PageResult;
use crate::tags::PopularTag;

pub mod chrome;
pub mod layout;
pub mod list_renderer;
pub mod post_renderer;
pub mod tag_index_renderer;

/// Pagination block as the templates consume it. Empty-string URLs plus
/// the `has_*` switches keep the template logic to plain sections.
#[derive(Debug, Clone, ramhorns::Content)]
pub struct PaginationView {
    pub current: u32,
    pub count: u32,
    pub prev: String,
    pub next: String,
    pub has_prev: bool,
    pub has_next: bool,
    pub pages: Vec<PageLinkView>,
    pub show: bool,
}

#[derive(Debug, Clone, ramhorns::Content)]
pub struct PageLinkView {
    pub number: u32,
    pub url: String,
    pub current: bool,
}

impl From<&PageResult> for PaginationView {
    fn from(result: &PageResult) -> Self {
        PaginationView {
            current: result.current,
            count: result.total_pages,
            has_prev: result.prev_url.is_some(),
            has_next: result.next_url.is_some(),
            prev: result.prev_url.clone().unwrap_or_default(),
            next: result.next_url.clone().unwrap_or_default(),
            pages: result.links.iter()
                .map(|link| PageLinkView {
                    number: link.number,
                    url: link.url.clone(),
                    current: link.number == result.current,
                })
                .collect(),
            show: result.total_pages > 1,
        }
    }
}

/// The site-wide widgets every page template may reference. Each value
/// is computed at most once per request, and not at all when the
/// template does not mention it (the renderers check their template
/// source before pulling).
pub struct SidebarWidgets<'a> {
    latest_posts: Deferred<'a, Vec<PostCard>>,
    popular_tags: Deferred<'a, Vec<PopularTag>>,
}

impl<'a> SidebarWidgets<'a> {
    pub fn new(latest_posts: impl Fn() -> Vec<PostCard> + 'a,
               popular_tags: impl Fn() -> Vec<PopularTag> + 'a) -> Self {
        SidebarWidgets {
            latest_posts: Deferred::new(latest_posts),
            popular_tags: Deferred::new(popular_tags),
        }
    }

    pub fn latest_posts(&self) -> &[PostCard] {
        self.latest_posts.get()
    }

    pub fn popular_tags(&self) -> &[PopularTag] {
        self.popular_tags.get()
    }
}

#[cfg(test)]
mod tests {
    use crate::paginator;

    use super::*;

    #[test]
    fn test_pagination_view_mapping() {
        let result = paginator::paginate(2, 10, 25, "/blog");
        let view = PaginationView::from(&result);

        assert_eq!(view.current, 2);
        assert_eq!(view.count, 3);
        assert!(view.has_prev && view.has_next);
        assert_eq!(view.prev, "/blog/1");
        assert_eq!(view.next, "/blog/3");
        assert!(view.show);
        assert!(view.pages[1].current);
        assert!(!view.pages[0].current);
    }

    #[test]
    fn test_single_page_hides_pagination() {
        let result = paginator::paginate(1, 10, 5, "/blog");
        let view = PaginationView::from(&result);
        assert!(!view.show);
        assert_eq!(view.prev, "");
        assert_eq!(view.next, "");
    }
}
