use std::fmt;

use serde::{Deserialize, Deserializer};

/// Publication state of a post. The order matters: visibility checks
/// compare against a minimum status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PostStatus {
    Draft = 0,
    Pending = 1,
    Published = 2,
}

impl PostStatus {
    pub fn from_i64(value: i64) -> Option<PostStatus> {
        match value {
            0 => Some(PostStatus::Draft),
            1 => Some(PostStatus::Pending),
            2 => Some(PostStatus::Published),
            _ => None,
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PostStatus::Draft => "draft",
            PostStatus::Pending => "pending",
            PostStatus::Published => "published",
        };
        write!(f, "{}", name)
    }
}

impl<'de> Deserialize<'de> for PostStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
    {
        use serde::de::Error;
        let value = i64::deserialize(deserializer)?;
        PostStatus::from_i64(value)
            .ok_or_else(|| Error::custom(format!("invalid post status: {}", value)))
    }
}

/// A stored post record. Read-only for this crate; records are produced
/// by an administrative path that lives elsewhere.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub intro: Option<String>,
    pub content: String,
    #[serde(deserialize_with = "flag_from_int")]
    pub markdown: bool,
    pub status: PostStatus,
    /// Unix timestamp; meaningful only when status is at least Pending.
    pub published_at: i64,
    pub lang: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub cover_photo: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub cover_thumbnail: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub cover_mobile: Option<String>,
    pub author_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub id: i64,
    pub username: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub fullname: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub avatar: Option<String>,
}

impl Author {
    /// Display name shown next to a post: full name when set, login
    /// name otherwise.
    pub fn display_name(&self) -> &str {
        match self.fullname {
            Some(ref fullname) => fullname.as_str(),
            None => self.username.as_str(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Join row between a post and a tag. No attributes of its own.
#[derive(Debug, Clone, Deserialize)]
pub struct TagRelationship {
    pub post_id: i64,
    pub tag_id: i64,
}

/// Some upstream exports store the markdown switch as 0/1 rather than a
/// boolean. This is the single point where that coercion happens.
fn flag_from_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

/// Upstream exports use empty strings for missing optional text fields.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
