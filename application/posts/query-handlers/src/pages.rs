use http_client::RequestOptions;
use post_dao::PostStore;
use post_errors::PostError;
use post_models::Post;
use post_queries::{Paginated, PostQueryParams};

use crate::PostQueryHandler;

/// Infinite list over one filter: pages are fetched in order and kept.
///
/// Each page goes through [`PostQueryHandler::list_paginated`], so pages
/// share cache entries and invalidation with plain paginated reads.
pub struct PostPages<S> {
    handler: PostQueryHandler<S>,
    params: PostQueryParams,
    page_size: u32,
    pages: Vec<Paginated<Post>>,
}

impl<S: PostStore> PostPages<S> {
    pub(crate) fn new(
        handler: PostQueryHandler<S>, params: PostQueryParams, page_size: u32,
    ) -> Self {
        Self {
            handler,
            params,
            page_size,
            pages: Vec::new(),
        }
    }

    /// True until a loaded page reports it is the last one.
    pub fn has_next_page(&self) -> bool {
        self.pages.last().is_none_or(Paginated::has_next)
    }

    /// Loads the page after the last loaded one. `None` once exhausted.
    pub async fn fetch_next_page(
        &mut self, options: &RequestOptions,
    ) -> Result<Option<&Paginated<Post>>, PostError> {
        if !self.has_next_page() {
            return Ok(None);
        }
        let next = u32::try_from(self.pages.len()).unwrap_or(u32::MAX).saturating_add(1);
        let params = self.params.clone().with_page(next, self.page_size);
        let page = self.handler.list_paginated(&params, options).await?;
        self.pages.push(page);
        Ok(self.pages.last())
    }

    /// Drops every loaded page and reloads as many as were loaded before.
    pub async fn refetch(&mut self, options: &RequestOptions) -> Result<(), PostError> {
        let loaded = self.pages.len().max(1);
        self.pages.clear();
        while self.pages.len() < loaded && self.has_next_page() {
            self.fetch_next_page(options).await?;
        }
        Ok(())
    }

    pub fn pages(&self) -> &[Paginated<Post>] { &self.pages }

    /// Items of every loaded page, in page order.
    pub fn items(&self) -> impl Iterator<Item = &Post> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    pub fn total(&self) -> Option<usize> { self.pages.last().map(|p| p.total) }
}
