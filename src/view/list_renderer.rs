use ramhorns::Template;

use crate::assembler::PostCard;
use crate::error::{BlogError, BlogResult};
use crate::pages::Listing;
use crate::tags::PopularTag;
use crate::view::{PaginationView, SidebarWidgets};

#[derive(ramhorns::Content)]
struct ListingPage {
    header: String,
    has_header: bool,
    posts: Vec<PostCard>,
    pagination: PaginationView,
    latest_posts: Vec<PostCard>,
    popular_tags: Vec<PopularTag>,
}

/// Renders the shared listing body (latest posts, tag, author and
/// search pages all use it, only the header line differs).
pub struct ListRenderer<'a> {
    template: Template<'a>,
    uses_latest_posts: bool,
    uses_popular_tags: bool,
}

impl ListRenderer<'_> {
    pub fn new(tpl_src: &str) -> BlogResult<ListRenderer> {
        let template = Template::new(tpl_src)
            .map_err(|e| BlogError::Template(format!("listing template: {}", e)))?;

        Ok(ListRenderer {
            template,
            uses_latest_posts: tpl_src.contains("latest_posts"),
            uses_popular_tags: tpl_src.contains("popular_tags"),
        })
    }

    pub fn render(&self, listing: &Listing, widgets: &SidebarWidgets) -> String {
        let latest_posts = if self.uses_latest_posts {
            widgets.latest_posts().to_vec()
        } else {
            Vec::new()
        };
        let popular_tags = if self.uses_popular_tags {
            widgets.popular_tags().to_vec()
        } else {
            Vec::new()
        };

        self.template.render(&ListingPage {
            header: listing.header.clone().unwrap_or_default(),
            has_header: listing.header.is_some(),
            posts: listing.posts.clone(),
            pagination: PaginationView::from(&listing.pagination),
            latest_posts,
            popular_tags,
        })
    }
}
