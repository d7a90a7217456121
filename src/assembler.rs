use uuid::Uuid;

use crate::dates;
use crate::dates::MonthTable;
use crate::model::{Author, Post};
use crate::model::Tag;
use crate::text_utils::{ellipsize, html_escape, strip_placeholders, strip_tags, truncate_chars};

/// Listing excerpts fall back to this many characters of the body when a
/// post has no intro.
const EXCERPT_CHARS: usize = 500;

/// Meta descriptions and social-sharing text are capped at this length.
const SUMMARY_CHARS: usize = 155;

/// Everything the assembler needs besides the rows themselves. All
/// per-request: nothing is read from ambient state.
pub struct AssembleContext<'a> {
    /// Site origin without a trailing slash, e.g. "https://example.org".
    pub base_url: &'a str,
    /// Upload area under the site origin, e.g. "/uploads".
    pub uploads_path: &'a str,
    /// Chrono pattern for the single formatted date on detail pages.
    pub date_pattern: &'a str,
    pub months: &'a MonthTable,
}

impl AssembleContext<'_> {
    pub fn post_url(&self, slug: &str) -> String {
        format!("{}/blog/wpis/{}", self.base_url, slug)
    }

    pub fn tag_url(&self, slug: &str) -> String {
        format!("{}/blog/temat/{}", self.base_url, slug)
    }

    /// Cover asset URL with the publication time as a cache buster, or
    /// None when the post has no cover in that variant.
    pub fn cover_url(&self, file: Option<&str>, published_at: i64) -> Option<String> {
        file.map(|file| {
            format!("{}{}/blog/{}?{}", self.base_url, self.uploads_path, file, published_at)
        })
    }

    /// Avatar URL, or an empty string when the author has none. No
    /// placeholder image is substituted here; that is a template choice.
    pub fn avatar_url(&self, avatar: Option<&str>) -> String {
        match avatar {
            Some(file) => format!("{}{}/users/{}", self.base_url, self.uploads_path, file),
            None => String::new(),
        }
    }
}

/// Stable identifier keying the third-party comment thread of a post.
/// Derived from the id and canonical URL only, so it survives rebuilds
/// and process restarts.
pub fn syndication_id(post_id: i64, canonical_url: &str) -> String {
    let seed = format!("{}{}", post_id, canonical_url);
    Uuid::new_v5(&Uuid::NAMESPACE_URL, seed.as_bytes()).to_string()
}

#[derive(Debug, Clone, PartialEq, ramhorns::Content)]
pub struct TagView {
    pub name: String,
    pub slug: String,
    pub url: String,
}

#[derive(Debug, Clone, ramhorns::Content)]
pub struct DateParts {
    pub time: String,
    pub day: String,
    pub month: String,
    pub year: String,
}

/// A post as listing, tag, author and search pages show it: plain-text
/// excerpt, thumbnail cover, calendar-parts date.
#[derive(Debug, Clone, ramhorns::Content)]
pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub content: String,
    pub author_name: String,
    pub cover_url: Option<String>,
    pub date: DateParts,
    pub tags: Option<Vec<TagView>>,
    pub syndication_id: String,
}

/// A post as its own page shows it: full (possibly markdown-rendered)
/// HTML body, photo cover, single localized date string, plus the
/// plain-text summary used for meta description and social sharing.
#[derive(Debug, Clone, ramhorns::Content)]
pub struct PostPage {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub lang: String,
    pub content: String,
    pub intro: Option<String>,
    pub author_name: String,
    pub author_avatar_url: String,
    pub cover_url: Option<String>,
    pub cover_mobile_url: Option<String>,
    pub date_label: String,
    pub datetime: String,
    pub tags: Option<Vec<TagView>>,
    pub syndication_id: String,
    pub summary: String,
}

/// Empty tag lists become None so templates can treat the whole tag
/// section as absent.
pub fn tag_views(ctx: &AssembleContext, tags: &[Tag]) -> Option<Vec<TagView>> {
    if tags.is_empty() {
        return None;
    }
    Some(tags.iter()
        .map(|tag| TagView {
            name: tag.name.clone(),
            slug: tag.slug.clone(),
            url: ctx.tag_url(&tag.slug),
        })
        .collect())
}

/// Plain-text excerpt for listing cards: the intro verbatim when there
/// is one, the first 500 characters of the body otherwise. Markdown is
/// rendered before stripping so formatted posts do not leak syntax into
/// the excerpt.
fn excerpt(post: &Post) -> String {
    let source = match post.intro {
        Some(ref intro) => intro.clone(),
        None => truncate_chars(&post.content, EXCERPT_CHARS).to_string(),
    };

    let html = if post.markdown {
        markdown::to_html(&source)
    } else {
        source
    };

    strip_tags(&html)
}

/// Plain-text summary of a post body for meta description and sharing
/// snippets.
pub fn summarize(content: &str) -> String {
    let text = strip_tags(&strip_placeholders(content));
    ellipsize(&html_escape(&text), SUMMARY_CHARS, "...")
}

fn author_name(author: Option<&Author>) -> String {
    author.map(|a| a.display_name().to_string()).unwrap_or_default()
}

/// Builds the listing-card view of a post. The source row is only read;
/// the card owns all of its data.
pub fn assemble_card(ctx: &AssembleContext, post: &Post,
                     author: Option<&Author>, tags: &[Tag]) -> PostCard {
    let url = ctx.post_url(&post.slug);

    PostCard {
        id: post.id,
        title: html_escape(&post.title),
        syndication_id: syndication_id(post.id, &url),
        url,
        content: excerpt(post),
        author_name: author_name(author),
        cover_url: ctx.cover_url(post.cover_thumbnail.as_deref(), post.published_at),
        date: {
            let parts = dates::calendar_parts(post.published_at, ctx.months);
            DateParts {
                time: parts.time,
                day: parts.day,
                month: parts.month,
                year: parts.year,
            }
        },
        tags: tag_views(ctx, tags),
    }
}

/// Builds the full detail view of a post.
pub fn assemble_page(ctx: &AssembleContext, post: &Post,
                     author: Option<&Author>, tags: &[Tag]) -> PostPage {
    let url = ctx.post_url(&post.slug);

    let content = if post.markdown {
        markdown::to_html(&post.content)
    } else {
        post.content.clone()
    };

    let intro = post.intro.as_ref().map(|intro| {
        if post.markdown {
            markdown::to_html(intro)
        } else {
            intro.clone()
        }
    });

    PostPage {
        id: post.id,
        title: html_escape(&post.title),
        syndication_id: syndication_id(post.id, &url),
        url,
        lang: post.lang.clone(),
        summary: summarize(&content),
        content,
        intro,
        author_name: author_name(author),
        author_avatar_url: ctx.avatar_url(author.and_then(|a| a.avatar.as_deref())),
        cover_url: ctx.cover_url(post.cover_photo.as_deref(), post.published_at),
        cover_mobile_url: ctx.cover_url(post.cover_mobile.as_deref(), post.published_at),
        date_label: dates::format_localized(post.published_at, ctx.date_pattern, ctx.months),
        datetime: dates::calendar_parts(post.published_at, ctx.months).time,
        tags: tag_views(ctx, tags),
    }
}

#[cfg(test)]
mod tests {
    use crate::dates::MonthTable;
    use crate::model::PostStatus;

    use super::*;

    fn months() -> MonthTable {
        vec![("nov".to_string(), "lis".to_string())].into_iter().collect()
    }

    fn post() -> Post {
        Post {
            id: 12,
            title: "Pierwszy <b>wpis</b>".to_string(),
            slug: "pierwszy-wpis".to_string(),
            intro: None,
            content: "Treść wpisu.".to_string(),
            markdown: false,
            status: PostStatus::Published,
            // 2023-11-05 14:30:00 UTC
            published_at: 1_699_194_600,
            lang: "pl".to_string(),
            cover_photo: Some("full.jpg".to_string()),
            cover_thumbnail: Some("thumb.jpg".to_string()),
            cover_mobile: None,
            author_id: 1,
        }
    }

    fn author() -> Author {
        Author {
            id: 1,
            username: "jkowalski".to_string(),
            fullname: Some("Jan Kowalski".to_string()),
            avatar: Some("jan.png".to_string()),
        }
    }

    fn ctx(months: &MonthTable) -> AssembleContext {
        AssembleContext {
            base_url: "https://example.org",
            uploads_path: "/uploads",
            date_pattern: "%d %b %Y",
            months,
        }
    }

    #[test]
    fn test_card_urls_and_escaping() {
        let months = months();
        let ctx = ctx(&months);
        let card = assemble_card(&ctx, &post(), Some(&author()), &[]);

        assert_eq!(card.url, "https://example.org/blog/wpis/pierwszy-wpis");
        assert_eq!(card.title, "Pierwszy &lt;b&gt;wpis&lt;/b&gt;");
        assert_eq!(card.author_name, "Jan Kowalski");
        assert_eq!(card.cover_url.as_deref(),
                   Some("https://example.org/uploads/blog/thumb.jpg?1699194600"));
        assert_eq!(card.tags, None);
        assert_eq!(card.date.day, "05");
        assert_eq!(card.date.month, "lis");
    }

    #[test]
    fn test_excerpt_uses_intro_verbatim() {
        let months = months();
        let ctx = ctx(&months);
        let mut post = post();
        post.intro = Some("Krótki wstęp.".to_string());
        post.content = "x".repeat(600);

        let card = assemble_card(&ctx, &post, None, &[]);
        assert_eq!(card.content, "Krótki wstęp.");
    }

    #[test]
    fn test_excerpt_truncates_body_to_500_chars() {
        let months = months();
        let ctx = ctx(&months);
        let mut post = post();
        post.content = "y".repeat(600);

        let card = assemble_card(&ctx, &post, None, &[]);
        assert_eq!(card.content.chars().count(), 500);
    }

    #[test]
    fn test_excerpt_renders_markdown_then_strips() {
        let months = months();
        let ctx = ctx(&months);
        let mut post = post();
        post.markdown = true;
        post.content = "Some **bold** text".to_string();

        let card = assemble_card(&ctx, &post, None, &[]);
        assert_eq!(card.content.trim(), "Some bold text");
    }

    #[test]
    fn test_detail_keeps_html_and_summarizes_separately() {
        let months = months();
        let ctx = ctx(&months);
        let mut post = post();
        post.markdown = true;
        post.content = "A {widget} of **bold** text".to_string();

        let page = assemble_page(&ctx, &post, Some(&author()), &[]);
        assert!(page.content.contains("<strong>bold</strong>"));
        assert_eq!(page.summary, "A  of bold text");
        assert_eq!(page.date_label, "05 lis 2023");
        assert_eq!(page.author_avatar_url, "https://example.org/uploads/users/jan.png");
    }

    #[test]
    fn test_summary_is_truncated_with_ellipsis() {
        let summary = summarize(&"ż".repeat(200));
        assert_eq!(summary.chars().count(), 155);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_missing_pieces_degrade() {
        let months = months();
        let ctx = ctx(&months);
        let mut post = post();
        post.cover_photo = None;
        post.cover_thumbnail = None;

        let card = assemble_card(&ctx, &post, None, &[]);
        assert_eq!(card.cover_url, None);
        assert_eq!(card.author_name, "");

        let page = assemble_page(&ctx, &post, None, &[]);
        assert_eq!(page.author_avatar_url, "");
        assert_eq!(page.cover_url, None);
    }

    #[test]
    fn test_syndication_id_is_deterministic() {
        let a = syndication_id(12, "https://example.org/blog/wpis/pierwszy-wpis");
        let b = syndication_id(12, "https://example.org/blog/wpis/pierwszy-wpis");
        assert_eq!(a, b);

        let other = syndication_id(13, "https://example.org/blog/wpis/pierwszy-wpis");
        assert_ne!(a, other);
    }

    #[test]
    fn test_tag_url_generation_is_idempotent() {
        let months = months();
        let ctx = ctx(&months);
        let tags = vec![Tag { id: 1, name: "rust".to_string(), slug: "rust".to_string() }];

        let views = tag_views(&ctx, &tags).unwrap();
        assert_eq!(views[0].url, "https://example.org/blog/temat/rust");

        // rebuilding from the view's own slug changes nothing
        let again = TagView {
            name: views[0].name.clone(),
            slug: views[0].slug.clone(),
            url: ctx.tag_url(&views[0].slug),
        };
        assert_eq!(again, views[0]);
    }
}
