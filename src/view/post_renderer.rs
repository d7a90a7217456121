use ramhorns::Template;

use crate::assembler::{PostCard, PostPage};
use crate::error::{BlogError, BlogResult};
use crate::tags::PopularTag;
use crate::view::SidebarWidgets;

#[derive(ramhorns::Content)]
struct DetailPage<'a> {
    post: &'a PostPage,
    blog_title: &'a str,
    blog_desc: &'a str,
    latest_posts: Vec<PostCard>,
    popular_tags: Vec<PopularTag>,
}

/// Renders the single-post page body.
pub struct PostRenderer<'a> {
    template: Template<'a>,
    uses_latest_posts: bool,
    uses_popular_tags: bool,
}

impl PostRenderer<'_> {
    pub fn new(tpl_src: &str) -> BlogResult<PostRenderer> {
        let template = Template::new(tpl_src)
            .map_err(|e| BlogError::Template(format!("post template: {}", e)))?;

        Ok(PostRenderer {
            template,
            uses_latest_posts: tpl_src.contains("latest_posts"),
            uses_popular_tags: tpl_src.contains("popular_tags"),
        })
    }

    pub fn render(&self, post: &PostPage, blog_title: &str, blog_desc: &str,
                  widgets: &SidebarWidgets) -> String {
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

        self.template.render(&DetailPage {
            post,
            blog_title,
            blog_desc,
            latest_posts,
            popular_tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::assembler::{assemble_page, AssembleContext};
    use crate::dates::MonthTable;
    use crate::model::{Author, Tag};
    use crate::store::test_fixture::{post, NOW};

    use super::*;

    #[test]
    fn test_render_detail_body() {
        let months: MonthTable =
            vec![("nov".to_string(), "lis".to_string())].into_iter().collect();
        let ctx = AssembleContext {
            base_url: "https://example.org",
            uploads_path: "/uploads",
            date_pattern: "%d %b %Y",
            months: &months,
        };

        let mut row = post(3, "trzeci", NOW - 10);
        row.title = "Trzeci <wpis>".to_string();
        row.markdown = true;
        row.content = "Akapit **pogrubiony**".to_string();

        let author = Author {
            id: 1,
            username: "jkowalski".to_string(),
            fullname: None,
            avatar: None,
        };
        let tags = vec![Tag { id: 1, name: "rust".to_string(), slug: "rust".to_string() }];
        let page = assemble_page(&ctx, &row, Some(&author), &tags);

        let template_src = r##"{{#post}}TITLE=[{{{title}}}]
AUTHOR=[{{author_name}}]
DATE=[{{date_label}}]
TAGS=[{{#tags}}({{name}}:{{url}}){{/tags}}]
BODY=[{{{content}}}]{{/post}}
BLOG=[{{blog_title}}]"##;

        let renderer = PostRenderer::new(template_src).unwrap();
        let widgets = SidebarWidgets::new(Vec::new, Vec::new);
        let rendered = renderer.render(&page, "Mój blog", "Opis", &widgets);

        // title was escaped during assembly, triple braces keep it intact
        assert!(rendered.contains("TITLE=[Trzeci &lt;wpis&gt;]"));
        assert!(rendered.contains("AUTHOR=[jkowalski]"));
        assert!(rendered.contains("TAGS=[(rust:https://example.org/blog/temat/rust)]"));
        assert!(rendered.contains("<strong>pogrubiony</strong>"));
        assert!(rendered.contains("BLOG=[Mój blog]"));
    }
}
