use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::model::{Author, Post, Tag, TagRelationship};
use crate::visibility::PostFilter;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("error reading data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("error parsing data file: {0}")]
    Data(#[from] serde_json::Error),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DateOrder {
    Newest,
    Oldest,
}

/// A tag together with how many qualifying posts carry it.
#[derive(Debug, Clone)]
pub struct TagCount {
    pub tag: Tag,
    pub count: u64,
}

/// Read-only query capability over the blog tables. The pipeline issues
/// filtered reads only; writes happen in an administrative path outside
/// this crate.
pub trait Store: Send + Sync {
    /// Posts matching the filter, ordered by publication date, with an
    /// optional row window.
    fn posts(&self, filter: &PostFilter, order: DateOrder,
             limit: Option<u32>, offset: u64) -> Result<Vec<Post>, StoreError>;

    fn count_posts(&self, filter: &PostFilter) -> Result<u64, StoreError>;

    /// Same as `posts`, restricted to posts carrying the given tag.
    fn posts_for_tag(&self, tag_id: i64, filter: &PostFilter, order: DateOrder,
                     limit: Option<u32>, offset: u64) -> Result<Vec<Post>, StoreError>;

    fn count_posts_for_tag(&self, tag_id: i64, filter: &PostFilter) -> Result<u64, StoreError>;

    fn author(&self, id: i64) -> Result<Option<Author>, StoreError>;

    fn tags_for_post(&self, post_id: i64) -> Result<Vec<Tag>, StoreError>;

    fn tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, StoreError>;

    /// Tags with their distinct qualifying-post counts, most used first.
    /// Equal counts order by tag name so the result is deterministic.
    /// Tags with zero qualifying posts are omitted.
    fn tag_counts(&self, filter: &PostFilter) -> Result<Vec<TagCount>, StoreError>;

    /// Case-insensitive substring match of the phrase against title or
    /// content, further restricted by the filter.
    fn search_posts(&self, phrase: &str, filter: &PostFilter, order: DateOrder,
                    limit: Option<u32>, offset: u64) -> Result<Vec<Post>, StoreError>;

    fn count_search(&self, phrase: &str, filter: &PostFilter) -> Result<u64, StoreError>;
}

/// All blog tables loaded into memory from a JSON export. Immutable
/// after load, which is what lets the server share it without locking.
pub struct MemoryStore {
    posts: Vec<Post>,
    authors: Vec<Author>,
    tags: Vec<Tag>,
    relations: Vec<TagRelationship>,
}

#[derive(Deserialize)]
struct DataFile {
    posts: Vec<Post>,
    authors: Vec<Author>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    tag_relationships: Vec<TagRelationship>,
}

impl MemoryStore {
    pub fn new(posts: Vec<Post>, authors: Vec<Author>,
               tags: Vec<Tag>, relations: Vec<TagRelationship>) -> Self {
        MemoryStore { posts, authors, tags, relations }
    }

    pub fn from_file(path: &Path) -> Result<MemoryStore, StoreError> {
        let raw = fs::read_to_string(path)?;
        let data: DataFile = serde_json::from_str(&raw)?;
        Ok(MemoryStore::new(data.posts, data.authors, data.tags, data.tag_relationships))
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    fn select(&self, filter: &PostFilter, extra: impl Fn(&Post) -> bool,
              order: DateOrder, limit: Option<u32>, offset: u64) -> Vec<Post> {
        let mut rows: Vec<Post> = self.posts.iter()
            .filter(|post| filter.matches(post) && extra(post))
            .cloned()
            .collect();

        // id as a tie-break keeps equal timestamps in a stable order
        rows.sort_by_key(|post| (post.published_at, post.id));
        if order == DateOrder::Newest {
            rows.reverse();
        }

        let offset = offset.min(rows.len() as u64) as usize;
        let mut rows = rows.split_off(offset);
        if let Some(limit) = limit {
            rows.truncate(limit as usize);
        }
        rows
    }

    fn tagged(&self, tag_id: i64) -> impl Fn(&Post) -> bool + '_ {
        move |post: &Post| {
            self.relations.iter().any(|rel| rel.tag_id == tag_id && rel.post_id == post.id)
        }
    }

    fn phrase_match(phrase: &str) -> impl Fn(&Post) -> bool {
        let needle = phrase.to_lowercase();
        move |post: &Post| {
            post.title.to_lowercase().contains(&needle)
                || post.content.to_lowercase().contains(&needle)
        }
    }
}

impl Store for MemoryStore {
    fn posts(&self, filter: &PostFilter, order: DateOrder,
             limit: Option<u32>, offset: u64) -> Result<Vec<Post>, StoreError> {
        Ok(self.select(filter, |_| true, order, limit, offset))
    }

    fn count_posts(&self, filter: &PostFilter) -> Result<u64, StoreError> {
        Ok(self.posts.iter().filter(|post| filter.matches(post)).count() as u64)
    }

    fn posts_for_tag(&self, tag_id: i64, filter: &PostFilter, order: DateOrder,
                     limit: Option<u32>, offset: u64) -> Result<Vec<Post>, StoreError> {
        Ok(self.select(filter, self.tagged(tag_id), order, limit, offset))
    }

    fn count_posts_for_tag(&self, tag_id: i64, filter: &PostFilter) -> Result<u64, StoreError> {
        let tagged = self.tagged(tag_id);
        Ok(self.posts.iter().filter(|post| filter.matches(post) && tagged(post)).count() as u64)
    }

    fn author(&self, id: i64) -> Result<Option<Author>, StoreError> {
        Ok(self.authors.iter().find(|author| author.id == id).cloned())
    }

    fn tags_for_post(&self, post_id: i64) -> Result<Vec<Tag>, StoreError> {
        let mut tags: Vec<Tag> = self.relations.iter()
            .filter(|rel| rel.post_id == post_id)
            .filter_map(|rel| self.tags.iter().find(|tag| tag.id == rel.tag_id))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    fn tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, StoreError> {
        Ok(self.tags.iter().find(|tag| tag.slug == slug).cloned())
    }

    fn tag_counts(&self, filter: &PostFilter) -> Result<Vec<TagCount>, StoreError> {
        let mut counts: Vec<TagCount> = self.tags.iter()
            .map(|tag| {
                let tagged = self.tagged(tag.id);
                let count = self.posts.iter()
                    .filter(|post| filter.matches(post) && tagged(post))
                    .count() as u64;
                TagCount { tag: tag.clone(), count }
            })
            .filter(|entry| entry.count > 0)
            .collect();

        counts.sort_by(|a, b| {
            b.count.cmp(&a.count).then_with(|| a.tag.name.cmp(&b.tag.name))
        });
        Ok(counts)
    }

    fn search_posts(&self, phrase: &str, filter: &PostFilter, order: DateOrder,
                    limit: Option<u32>, offset: u64) -> Result<Vec<Post>, StoreError> {
        Ok(self.select(filter, Self::phrase_match(phrase), order, limit, offset))
    }

    fn count_search(&self, phrase: &str, filter: &PostFilter) -> Result<u64, StoreError> {
        let matcher = Self::phrase_match(phrase);
        Ok(self.posts.iter().filter(|post| filter.matches(post) && matcher(post)).count() as u64)
    }
}

#[cfg(test)]
pub mod test_fixture {
    use crate::model::PostStatus;

    use super::*;

    pub const NOW: i64 = 1_700_000_000;

    pub fn post(id: i64, slug: &str, published_at: i64) -> Post {
        Post {
            id,
            title: format!("Post {}", id),
            slug: slug.to_string(),
            intro: None,
            content: format!("Content of post {}", id),
            markdown: false,
            status: PostStatus::Published,
            published_at,
            lang: "pl".to_string(),
            cover_photo: None,
            cover_thumbnail: None,
            cover_mobile: None,
            author_id: 1,
        }
    }

    /// Five published Polish posts (ids 1..=5, one hour apart, id 5
    /// newest), one pending, one scheduled in the future, one English.
    /// Tags: "rust" on 1, 2, 3; "cooking" on 2; "travel" on the English
    /// post only.
    pub fn store() -> MemoryStore {
        let mut posts: Vec<Post> = (1..=5)
            .map(|id| post(id, &format!("post-{}", id), NOW - 3600 * (6 - id)))
            .collect();

        let mut pending = post(6, "pending-post", NOW - 100);
        pending.status = PostStatus::Pending;
        posts.push(pending);

        posts.push(post(7, "future-post", NOW + 3600));

        let mut english = post(8, "english-post", NOW - 50);
        english.lang = "en".to_string();
        posts.push(english);

        let authors = vec![
            Author {
                id: 1,
                username: "jkowalski".to_string(),
                fullname: Some("Jan Kowalski".to_string()),
                avatar: Some("jan.png".to_string()),
            },
            Author {
                id: 2,
                username: "anowak".to_string(),
                fullname: None,
                avatar: None,
            },
        ];

        let tags = vec![
            Tag { id: 1, name: "rust".to_string(), slug: "rust".to_string() },
            Tag { id: 2, name: "cooking".to_string(), slug: "cooking".to_string() },
            Tag { id: 3, name: "travel".to_string(), slug: "travel".to_string() },
        ];

        let relations = vec![
            TagRelationship { post_id: 1, tag_id: 1 },
            TagRelationship { post_id: 2, tag_id: 1 },
            TagRelationship { post_id: 3, tag_id: 1 },
            TagRelationship { post_id: 2, tag_id: 2 },
            TagRelationship { post_id: 8, tag_id: 3 },
        ];

        MemoryStore::new(posts, authors, tags, relations)
    }
}
