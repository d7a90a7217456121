use ramhorns::Template;

use crate::assembler::PostPage;
use crate::error::{BlogError, BlogResult};

/// Shared page-header and page-footer output sinks. Handlers append
/// social metadata, feed links and widget snippets here; the layout
/// template receives the joined fragments.
#[derive(Default)]
pub struct PageChrome {
    header: Vec<String>,
    footer: Vec<String>,
}

impl PageChrome {
    pub fn new() -> PageChrome {
        PageChrome::default()
    }

    pub fn append_header(&mut self, fragment: String) {
        self.header.push(fragment);
    }

    pub fn append_footer(&mut self, fragment: String) {
        self.footer.push(fragment);
    }

    pub fn rss_link(&mut self, feed_url: &str) {
        self.append_header(format!(
            r#"<link rel="alternate" type="application/rss+xml" title="RSS" href="{}">"#,
            feed_url));
    }

    /// Open Graph block for listing pages. Values arrive pre-escaped.
    pub fn og_site(&mut self, title: &str, desc: &str, url: &str, image: Option<&str>) {
        self.append_header(format!(r#"<meta property="og:url" content="{}">"#, url));
        self.append_header(r#"<meta property="og:type" content="blog">"#.to_string());
        self.append_header(format!(r#"<meta property="og:title" content="{}">"#, title));
        self.append_header(format!(r#"<meta property="og:description" content="{}">"#, desc));
        if let Some(image) = image {
            self.append_header(format!(r#"<meta property="og:image" content="{}">"#, image));
        }
    }

    /// Open Graph block for a single post: article type, the post's meta
    /// summary, the mobile cover variant as the share image.
    pub fn og_article(&mut self, post: &PostPage) {
        self.append_header(format!(r#"<meta property="og:url" content="{}">"#, post.url));
        self.append_header(r#"<meta property="og:type" content="article">"#.to_string());
        self.append_header(format!(r#"<meta property="og:title" content="{}">"#, post.title));
        self.append_header(format!(r#"<meta property="og:description" content="{}">"#, post.summary));
        if let Some(ref cover) = post.cover_mobile_url {
            self.append_header(format!(r#"<meta property="og:image" content="{}">"#, cover));
        }
    }

    pub fn header_html(&self) -> String {
        self.header.join("\n")
    }

    pub fn footer_html(&self) -> String {
        self.footer.join("\n")
    }
}

#[derive(ramhorns::Content)]
struct CommentsView<'a> {
    is_post: bool,
    identifier: &'a str,
    url: &'a str,
}

/// Renders the external comment-widget snippet appended to page
/// footers. On detail pages the identifier is the post's syndication
/// id; listing pages embed the widget without one.
pub fn render_comments(tpl_src: &str, is_post: bool,
                       identifier: &str, url: &str) -> BlogResult<String> {
    let template = Template::new(tpl_src)
        .map_err(|e| BlogError::Template(format!("comments template: {}", e)))?;
    Ok(template.render(&CommentsView { is_post, identifier, url }))
}
