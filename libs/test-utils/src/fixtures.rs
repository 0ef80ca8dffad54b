use chrono::{DateTime, Duration, Utc};
use post_models::{Post, PostStatus};

/// Fixed reference instant used by fixtures.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap_or_default()
}

/// A post whose `created_at` grows with its id.
pub fn post(id: i64, status: PostStatus, tags: &[&str]) -> Post {
    let created_at = epoch() + Duration::hours(id);
    Post {
        id,
        title: format!("Post {id}"),
        content: format!("Content of post {id}"),
        excerpt: None,
        author_id: 1,
        author_name: Some("Test Author".to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        status,
        created_at,
        updated_at: created_at,
    }
}

pub fn published(id: i64) -> Post { post(id, PostStatus::Published, &[]) }

pub fn draft(id: i64) -> Post { post(id, PostStatus::Draft, &[]) }
