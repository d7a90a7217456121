use ramhorns::Template;

use crate::error::{BlogError, BlogResult};
use crate::paginator::PageResult;
use crate::tags::TagIndexEntry;
use crate::view::PaginationView;

#[derive(ramhorns::Content)]
struct TagIndexPage<'a> {
    title: &'a str,
    desc: &'a str,
    items: &'a Vec<TagIndexEntry>,
    pagination: PaginationView,
}

/// Renders the paginated all-tags page body.
pub struct TagIndexRenderer<'a> {
    template: Template<'a>,
}

impl TagIndexRenderer<'_> {
    pub fn new(tpl_src: &str) -> BlogResult<TagIndexRenderer> {
        let template = Template::new(tpl_src)
            .map_err(|e| BlogError::Template(format!("tag index template: {}", e)))?;
        Ok(TagIndexRenderer { template })
    }

    pub fn render(&self, title: &str, desc: &str,
                  entries: &Vec<TagIndexEntry>, pagination: &PageResult) -> String {
        self.template.render(&TagIndexPage {
            title,
            desc,
            items: entries,
            pagination: PaginationView::from(pagination),
        })
    }
}
