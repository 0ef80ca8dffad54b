//! Adapter for the public JSONPlaceholder sample API, whose posts carry
//! only `userId`, `id`, `title` and `body`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use post_models::{ExcerptPolicy, Post, PostStatus};
use serde::{Deserialize, Serialize};

pub const SAMPLE_TAGS: [&str; 2] = ["Sample", "JSONPlaceholder"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPlaceholderPost {
    pub user_id: i64,
    pub id: i64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonPlaceholderUser {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
}

impl JsonPlaceholderPost {
    /// The sample API has no status or timestamps: every post is published
    /// and stamped with `now`.
    pub fn into_post(
        self, user: Option<&JsonPlaceholderUser>, excerpt: &ExcerptPolicy,
        now: DateTime<Utc>,
    ) -> Post {
        let author_name = user
            .filter(|u| !u.name.is_empty())
            .map_or_else(|| format!("User {}", self.user_id), |u| u.name.clone());
        Post {
            id: self.id,
            excerpt: Some(excerpt.excerpt(&self.body)),
            title: self.title,
            content: self.body,
            author_id: self.user_id,
            author_name: Some(author_name),
            tags: SAMPLE_TAGS.iter().map(|t| t.to_string()).collect(),
            status: PostStatus::Published,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Adapts a page of sample posts, resolving authors from `users` by id.
pub fn adapt_posts(
    posts: Vec<JsonPlaceholderPost>, users: &[JsonPlaceholderUser],
    excerpt: &ExcerptPolicy, now: DateTime<Utc>,
) -> Vec<Post> {
    let by_id: HashMap<i64, &JsonPlaceholderUser> =
        users.iter().map(|u| (u.id, u)).collect();
    posts
        .into_iter()
        .map(|post| {
            let user = by_id.get(&post.user_id).copied();
            post.into_post(user, excerpt, now)
        })
        .collect()
}
