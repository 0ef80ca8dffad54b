pub mod aggregates;
pub mod filter;
pub mod paginated;

pub use aggregates::{all_tags, latest, popular, popular_tags, recommended};
pub use filter::{count_posts, filter_posts, matches};
pub use paginated::Paginated;
use post_models::PostStatus;
use serde::{Deserialize, Serialize};

/// Filters and pagination for post listings. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostQueryParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,
}

impl PostQueryParams {
    pub fn new() -> Self { Self::default() }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    pub fn without_pagination(&self) -> Self {
        Self {
            page: None,
            page_size: None,
            ..self.clone()
        }
    }

    /// `(page, page_size)` when both are set and non-zero.
    pub fn pagination(&self) -> Option<(u32, u32)> {
        match (self.page, self.page_size) {
            (Some(page), Some(size)) if page > 0 && size > 0 => {
                Some((page, size))
            }
            _ => None,
        }
    }

    /// True when at least one filter narrows the collection. Pagination
    /// does not count.
    pub fn has_criteria(&self) -> bool {
        let normalized = self.normalized();
        normalized.search.is_some()
            || normalized.status.is_some()
            || normalized.tags.is_some()
            || normalized.author_id.is_some()
    }

    /// Canonical form used for cache keys: empty filters dropped, tags
    /// sorted and deduplicated.
    pub fn normalized(&self) -> Self {
        let mut tags = self.tags.clone().unwrap_or_default();
        tags.sort();
        tags.dedup();
        Self {
            page: self.page,
            page_size: self.page_size,
            search: self.search.clone().filter(|s| !s.is_empty()),
            status: self.status,
            tags: (!tags.is_empty()).then_some(tags),
            author_id: self.author_id,
        }
    }

    /// Query string pairs in the wire naming.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("pageSize", page_size.to_string()));
        }
        if let Some(author_id) = self.author_id {
            pairs.push(("authorId", author_id.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.clone()));
        }
        for tag in self.tags.iter().flatten() {
            pairs.push(("tags", tag.clone()));
        }
        pairs
    }
}
