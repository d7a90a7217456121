use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::assembler::{syndication_id, AssembleContext};
use crate::dates::rfc822;
use crate::error::BlogResult;
use crate::store::{DateOrder, Store};
use crate::text_utils::{decode_entities, strip_placeholders, strip_tags};
use crate::visibility::PostFilter;

/// A feed always carries at most this many posts, newest first. Never
/// paginated.
const FEED_ITEMS: u32 = 5;

#[derive(Debug, Clone)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub guid: String,
    pub cover_url: Option<String>,
    pub description: String,
    pub pub_date: String,
}

pub struct FeedChannel<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub description: &'a str,
}

/// Builds the items of the per-locale feed. The locale is an explicit
/// parameter because feeds live on per-locale URLs, not in a session.
pub fn feed_items(store: &dyn Store, ctx: &AssembleContext,
                  lang: &str, now: i64) -> BlogResult<Vec<FeedItem>> {
    let filter = PostFilter::listing(lang, now);
    let posts = store.posts(&filter, DateOrder::Newest, Some(FEED_ITEMS), 0)?;

    Ok(posts.into_iter()
        .map(|post| {
            let source = post.intro.as_deref().unwrap_or(post.content.as_str());
            let description = strip_tags(&decode_entities(&strip_placeholders(source)));
            let link = ctx.post_url(&post.slug);

            FeedItem {
                title: post.title.clone(),
                guid: syndication_id(post.id, &link),
                link,
                cover_url: ctx.cover_url(post.cover_mobile.as_deref(), post.published_at),
                description,
                pub_date: rfc822(post.published_at),
            }
        })
        .collect())
}

impl FeedChannel<'_> {
    /// Serializes the channel as an RSS 2.0 document, XML declaration
    /// included. Serve it as `application/xml`.
    pub fn render(&self, items: &[FeedItem]) -> quick_xml::Result<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        writer.write_event(Event::Start(rss))?;

        writer.write_event(Event::Start(BytesStart::new("channel")))?;
        push_text(&mut writer, "title", self.title)?;
        push_text(&mut writer, "link", self.link)?;
        push_text(&mut writer, "description", self.description)?;

        for item in items {
            writer.write_event(Event::Start(BytesStart::new("item")))?;

            push_text(&mut writer, "title", &item.title)?;
            push_text(&mut writer, "link", &item.link)?;

            let mut guid = BytesStart::new("guid");
            guid.push_attribute(("isPermaLink", "false"));
            writer.write_event(Event::Start(guid))?;
            writer.write_event(Event::Text(BytesText::new(&item.guid)))?;
            writer.write_event(Event::End(BytesEnd::new("guid")))?;

            if let Some(ref cover) = item.cover_url {
                let mut enclosure = BytesStart::new("enclosure");
                enclosure.push_attribute(("url", cover.as_str()));
                enclosure.push_attribute(("type", "image/jpeg"));
                writer.write_event(Event::Empty(enclosure))?;
            }

            push_text(&mut writer, "description", &item.description)?;
            push_text(&mut writer, "pubDate", &item.pub_date)?;

            writer.write_event(Event::End(BytesEnd::new("item")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        Ok(writer.into_inner().into_inner())
    }
}

/// The whole feed operation: select, shape, serialize.
pub fn generate(store: &dyn Store, ctx: &AssembleContext, channel: &FeedChannel,
                lang: &str, now: i64) -> BlogResult<Vec<u8>> {
    let items = feed_items(store, ctx, lang, now)?;
    Ok(channel.render(&items)?)
}

fn push_text(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str;

    use crate::dates::MonthTable;
    use crate::model::PostStatus;
    use crate::store::test_fixture::{post, store, NOW};
    use crate::store::MemoryStore;

    use super::*;

    fn months() -> MonthTable {
        MonthTable::new()
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
    fn test_items_are_capped_visible_and_newest_first() {
        let months = months();
        let ctx = ctx(&months);
        let store = store();

        let items = feed_items(&store, &ctx, "pl", NOW).unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].link, "https://example.org/blog/wpis/post-5");
        assert_eq!(items[4].link, "https://example.org/blog/wpis/post-1");
        for item in &items {
            assert!(!item.description.is_empty());
            assert!(item.pub_date.ends_with("+0000"));
        }
    }

    #[test]
    fn test_item_description_is_plain_text() {
        let months = months();
        let ctx = ctx(&months);

        let mut row = post(1, "styled", NOW - 10);
        row.intro = Some("B&amp;B {snippet} <b>bold</b>".to_string());
        row.cover_mobile = Some("m.jpg".to_string());
        let store = MemoryStore::new(vec![row], vec![], vec![], vec![]);

        let items = feed_items(&store, &ctx, "pl", NOW).unwrap();
        assert_eq!(items[0].description, "B&B  bold");
        assert_eq!(items[0].cover_url.as_deref(),
                   Some("https://example.org/uploads/blog/m.jpg?1699999990"));
    }

    #[test]
    fn test_render_xml() {
        let item = FeedItem {
            title: "Tytuł & co".to_string(),
            link: "https://example.org/blog/wpis/tytul".to_string(),
            guid: "guid-1".to_string(),
            cover_url: Some("https://example.org/uploads/blog/m.jpg?5".to_string()),
            description: "Opis wpisu".to_string(),
            pub_date: "Sun, 5 Nov 2023 14:30:00 +0000".to_string(),
        };

        let channel = FeedChannel {
            title: "Blog",
            link: "https://example.org",
            description: "Wpisy",
        };

        let xml = channel.render(&[item]).unwrap();
        assert_eq!(str::from_utf8(&xml).unwrap(), EXPECTED);
    }

    #[test]
    fn test_drafts_and_other_locales_stay_out() {
        let months = months();
        let ctx = ctx(&months);

        let mut draft = post(1, "draft", NOW - 10);
        draft.status = PostStatus::Draft;
        let mut english = post(2, "en-post", NOW - 20);
        english.lang = "en".to_string();
        let store = MemoryStore::new(vec![draft, english], vec![], vec![], vec![]);

        let items = feed_items(&store, &ctx, "pl", NOW).unwrap();
        assert!(items.is_empty());

        let items = feed_items(&store, &ctx, "en", NOW).unwrap();
        assert_eq!(items.len(), 1);
    }

    const EXPECTED: &str = r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Blog</title><link>https://example.org</link><description>Wpisy</description><item><title>Tytuł &amp; co</title><link>https://example.org/blog/wpis/tytul</link><guid isPermaLink="false">guid-1</guid><enclosure url="https://example.org/uploads/blog/m.jpg?5" type="image/jpeg"/><description>Opis wpisu</description><pubDate>Sun, 5 Nov 2023 14:30:00 +0000</pubDate></item></channel></rss>"#;
}
