pub mod config;
pub mod pages;
pub mod state;

use std::{future::Future, sync::Arc, time::Duration};

pub use config::{QueryConfig, StaleTimes};
use config::secs;
pub use pages::PostPages;
use common_errors::Classified;
use database_traits::GenericDao;
use http_client::{RequestOptions, RetryPolicy, with_retry};
use post_cache_keys::PostKeys;
use post_dao::PostStore;
use post_errors::PostError;
use post_models::{Post, TagCount};
use post_queries::{Paginated, PostQueryParams};
use query_cache::{QueryCache, QueryKey};
use serde::{Serialize, de::DeserializeOwned};
pub use state::QueryState;
use tracing::{debug, instrument, warn};

/// Read side for posts: cache-aside over a [`PostStore`].
///
/// A fresh cache entry is returned as is; a missing, invalidated or stale
/// one is refetched from the store and written back.
pub struct PostQueryHandler<S> {
    store: Arc<S>,
    cache: QueryCache,
    config: QueryConfig,
}

impl<S> Clone for PostQueryHandler<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: PostStore> PostQueryHandler<S> {
    pub fn new(store: Arc<S>, cache: QueryCache, config: QueryConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &QueryCache { &self.cache }

    #[instrument(skip(self, options))]
    pub async fn detail(
        &self, id: i64, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        let stale = secs(self.config.stale_times.detail);
        self.fetch(PostKeys::detail(id), stale, options, || {
            self.store.find_by_id(id, options)
        })
        .await
    }

    #[instrument(skip(self, options))]
    pub async fn list(
        &self, params: &PostQueryParams, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        let stale = secs(self.config.stale_times.list);
        self.fetch(PostKeys::list(params), stale, options, || {
            self.store.list(params, options)
        })
        .await
    }

    /// One page plus totals. Missing pagination falls back to page 1 with
    /// the configured page size.
    #[instrument(skip(self, options))]
    pub async fn list_paginated(
        &self, params: &PostQueryParams, options: &RequestOptions,
    ) -> Result<Paginated<Post>, PostError> {
        let (params, page, page_size) = self.paged(params);
        let stale = secs(self.config.stale_times.list);
        self.fetch_page(
            PostKeys::paginated(&params),
            &params,
            (page, page_size),
            stale,
            options,
        )
        .await
    }

    /// Page cursor over `params`, starting before the first page.
    pub fn pages(&self, params: &PostQueryParams) -> PostPages<S> {
        let page_size = params
            .pagination()
            .map_or(self.config.default_page_size, |(_, size)| size);
        PostPages::new(self.clone(), params.without_pagination(), page_size)
    }
    #[instrument(skip(self, options))]
    pub async fn by_author(
        &self, author_id: i64, params: &PostQueryParams,
        options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        let scoped = params.clone().with_author(author_id);
        let stale = secs(self.config.stale_times.author);
        self.fetch(PostKeys::by_author(author_id, params), stale, options, || {
            self.store.list(&scoped, options)
        })
        .await
    }

    #[instrument(skip(self, options))]
    pub async fn by_author_paginated(
        &self, author_id: i64, params: &PostQueryParams,
        options: &RequestOptions,
    ) -> Result<Paginated<Post>, PostError> {
        let (params, page, page_size) = self.paged(params);
        let scoped = params.clone().with_author(author_id);
        let stale = secs(self.config.stale_times.author);
        self.fetch_page(
            PostKeys::by_author_paged(author_id, &params),
            &scoped,
            (page, page_size),
            stale,
            options,
        )
        .await
    }

    /// An empty tag list matches nothing and never reaches the store.
    #[instrument(skip(self, options))]
    pub async fn by_tags(
        &self, tags: &[String], params: &PostQueryParams,
        options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        if tags.iter().all(|tag| tag.is_empty()) {
            debug!("No tags given, skipping tagged lookup");
            return Ok(Vec::new());
        }
        let scoped = params.clone().with_tags(tags.iter().cloned());
        let stale = secs(self.config.stale_times.tags);
        self.fetch(PostKeys::by_tags(tags, params), stale, options, || {
            self.store.list(&scoped, options)
        })
        .await
    }

    /// A search without any criteria yields nothing and never reaches the
    /// store.
    #[instrument(skip(self, options))]
    pub async fn search(
        &self, params: &PostQueryParams, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        if !params.has_criteria() {
            debug!("Search has no criteria, skipping");
            return Ok(Vec::new());
        }
        let stale = secs(self.config.stale_times.search);
        self.fetch(PostKeys::search(params), stale, options, || {
            self.store.list(params, options)
        })
        .await
    }

    #[instrument(skip(self, options))]
    pub async fn search_paginated(
        &self, params: &PostQueryParams, options: &RequestOptions,
    ) -> Result<Paginated<Post>, PostError> {
        let (params, page, page_size) = self.paged(params);
        if !params.has_criteria() {
            debug!("Search has no criteria, skipping");
            return Ok(Paginated::new(Vec::new(), 0, page, page_size));
        }
        let stale = secs(self.config.stale_times.search);
        self.fetch_page(
            PostKeys::search_paged(&params),
            &params,
            (page, page_size),
            stale,
            options,
        )
        .await
    }

    #[instrument(skip(self, options))]
    pub async fn count(
        &self, params: &PostQueryParams, options: &RequestOptions,
    ) -> Result<usize, PostError> {
        let stale = secs(self.config.stale_times.count);
        self.fetch(PostKeys::count(params), stale, options, || {
            self.store.count(params, options)
        })
        .await
    }

    #[instrument(skip(self, options))]
    pub async fn popular(
        &self, limit: usize, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        let stale = secs(self.config.stale_times.popular);
        self.fetch(PostKeys::popular(limit), stale, options, || {
            self.store.popular(limit, options)
        })
        .await
    }

    #[instrument(skip(self, options))]
    pub async fn latest(
        &self, limit: usize, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        let stale = secs(self.config.stale_times.latest);
        self.fetch(PostKeys::latest(limit), stale, options, || {
            self.store.latest(limit, options)
        })
        .await
    }

    #[instrument(skip(self, options))]
    pub async fn recommended(
        &self, user_id: Option<i64>, limit: usize, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        let stale = secs(self.config.stale_times.recommended);
        self.fetch(PostKeys::recommended(user_id, limit), stale, options, || {
            self.store.recommended(user_id, limit, options)
        })
        .await
    }

    #[instrument(skip(self, options))]
    pub async fn all_tags(
        &self, options: &RequestOptions,
    ) -> Result<Vec<String>, PostError> {
        let stale = secs(self.config.stale_times.all_tags);
        self.fetch(PostKeys::all_tags(), stale, options, || {
            self.store.all_tags(options)
        })
        .await
    }

    #[instrument(skip(self, options))]
    pub async fn popular_tags(
        &self, limit: usize, options: &RequestOptions,
    ) -> Result<Vec<TagCount>, PostError> {
        let stale = secs(self.config.stale_times.popular_tags);
        self.fetch(PostKeys::popular_tags(limit), stale, options, || {
            self.store.popular_tags(limit, options)
        })
        .await
    }

    async fn fetch<T, F, Fut>(
        &self, key: QueryKey, stale: Duration, options: &RequestOptions,
        load: F,
    ) -> Result<T, PostError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PostError>>,
    {
        match self.cache.read_fresh::<T>(&key, stale).await {
            Ok(Some(value)) => {
                debug!("Cache hit for {}", key);
                return Ok(value);
            }
            Ok(None) => debug!("Cache miss for {}, fetching from store", key),
            Err(err) => warn!("Dropping unreadable cache entry {}: {}", key, err),
        }

        let ticket = self.cache.ticket().await;
        let value = self.load(options, load).await?;

        match self.cache.write_fetched(key.clone(), &value, ticket).await {
            Ok(true) => {}
            Ok(false) => debug!("Dropping {}, invalidated while in flight", key),
            Err(err) => warn!("Failed to cache {}: {}", key, err),
        }
        Ok(value)
    }

    fn paged(&self, params: &PostQueryParams) -> (PostQueryParams, u32, u32) {
        let (page, page_size) = params
            .pagination()
            .unwrap_or((1, self.config.default_page_size));
        (params.clone().with_page(page, page_size), page, page_size)
    }

    async fn fetch_page(
        &self, key: QueryKey, params: &PostQueryParams, (page, page_size): (u32, u32),
        stale: Duration, options: &RequestOptions,
    ) -> Result<Paginated<Post>, PostError> {
        self.fetch(key, stale, options, move || {
            async move {
                let items = self.store.list(params, options).await?;
                let total = self.store.count(params, options).await?;
                Ok(Paginated::new(items, total, page, page_size))
            }
        })
        .await
    }

    async fn load<T, F, Fut>(
        &self, options: &RequestOptions, load: F,
    ) -> Result<T, PostError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PostError>>,
    {
        let attempt = || options.bounded(load(), PostError::Timeout);
        if options.retries == 0 {
            return attempt().await;
        }

        let policy = RetryPolicy {
            max_retries: options.retries,
            ..self.config.retry
        };
        with_retry(policy, |err: &PostError| err.is_retryable(), attempt).await
    }
}
