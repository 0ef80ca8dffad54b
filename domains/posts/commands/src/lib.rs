use chrono::{DateTime, Utc};
use post_errors::{FieldViolation, PostError};
use post_models::{Post, PostStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostCommand {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

impl CreatePostCommand {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_author(mut self, author_id: i64, name: Option<String>) -> Self {
        self.author_id = Some(author_id);
        self.author_name = name;
        self
    }

    pub fn validate(&self) -> Result<(), PostError> {
        let mut violations = Vec::new();
        if self.title.trim().is_empty() {
            violations.push(FieldViolation::new("title", "must not be empty"));
        }
        if self.content.trim().is_empty() {
            violations
                .push(FieldViolation::new("content", "must not be empty"));
        }
        if self.status == Some(PostStatus::Archived) {
            violations.push(FieldViolation::new(
                "status",
                "must be draft or published on create",
            ));
        }
        into_result(violations)
    }
}

/// Shallow update: every `None` field leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
}

impl UpdatePostCommand {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn status(status: PostStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), PostError> {
        let mut violations = Vec::new();
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            violations.push(FieldViolation::new("title", "must not be empty"));
        }
        if self.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            violations
                .push(FieldViolation::new("content", "must not be empty"));
        }
        into_result(violations)
    }

    /// Merges the present fields over `post` and stamps `updated_at`.
    pub fn apply(self, post: &mut Post, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(excerpt) = self.excerpt {
            post.excerpt = Some(excerpt);
        }
        if let Some(tags) = self.tags {
            post.tags = tags;
        }
        if let Some(status) = self.status {
            post.status = status;
        }
        post.updated_at = now.max(post.created_at);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDeletePostsCommand {
    pub ids: Vec<i64>,
}

impl BatchDeletePostsCommand {
    pub fn new(ids: impl Into<Vec<i64>>) -> Self { Self { ids: ids.into() } }

    pub fn validate(&self) -> Result<(), PostError> { validate_ids(&self.ids) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdateStatusCommand {
    pub ids: Vec<i64>,
    pub status: PostStatus,
}

impl BatchUpdateStatusCommand {
    pub fn new(ids: impl Into<Vec<i64>>, status: PostStatus) -> Self {
        Self {
            ids: ids.into(),
            status,
        }
    }

    pub fn validate(&self) -> Result<(), PostError> { validate_ids(&self.ids) }
}

fn validate_ids(ids: &[i64]) -> Result<(), PostError> {
    if ids.is_empty() {
        return Err(PostError::invalid("ids", "must not be empty"));
    }
    Ok(())
}

fn into_result(violations: Vec<FieldViolation>) -> Result<(), PostError> {
    if violations.is_empty() {
        Ok(())
    }
    else {
        Err(PostError::Validation { violations })
    }
}
