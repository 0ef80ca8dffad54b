use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(format!("unknown post status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub author_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_published(&self) -> bool { self.status == PostStatus::Published }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|tag| tags.contains(tag))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// How an excerpt is derived from content when the author gives none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcerptPolicy {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_ellipsis")]
    pub ellipsis: String,
}

fn default_max_chars() -> usize { 100 }
fn default_ellipsis() -> String { "...".into() }

impl Default for ExcerptPolicy {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            ellipsis: default_ellipsis(),
        }
    }
}

impl ExcerptPolicy {
    /// First `max_chars` characters of `content`, with the ellipsis
    /// appended only when something was cut.
    pub fn excerpt(&self, content: &str) -> String {
        match content.char_indices().nth(self.max_chars) {
            Some((cut, _)) => format!("{}{}", &content[..cut], self.ellipsis),
            None => content.to_string(),
        }
    }
}
