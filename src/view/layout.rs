use ramhorns::Template;

use crate::error::{BlogError, BlogResult};
use crate::view::chrome::PageChrome;

#[derive(ramhorns::Content)]
struct LayoutPage<'a> {
    page_title: &'a str,
    page_desc: &'a str,
    head_extra: String,
    body: &'a str,
    footer_extra: String,
}

/// Wraps a rendered page body in the site layout, injecting what the
/// handlers appended to the header/footer sinks.
pub struct LayoutRenderer<'a> {
    template: Template<'a>,
}

impl LayoutRenderer<'_> {
    pub fn new(tpl_src: &str) -> BlogResult<LayoutRenderer> {
        let template = Template::new(tpl_src)
            .map_err(|e| BlogError::Template(format!("layout template: {}", e)))?;
        Ok(LayoutRenderer { template })
    }

    /// `title` and `desc` arrive pre-escaped; the layout template emits
    /// them verbatim.
    pub fn render(&self, title: &str, desc: &str, body: &str, chrome: &PageChrome) -> String {
        self.template.render(&LayoutPage {
            page_title: title,
            page_desc: desc,
            head_extra: chrome.header_html(),
            body,
            footer_extra: chrome.footer_html(),
        })
    }
}
