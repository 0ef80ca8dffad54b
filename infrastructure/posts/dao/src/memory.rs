use std::{collections::HashSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use database_traits::GenericDao;
use http_client::RequestOptions;
use post_commands::{CreatePostCommand, UpdatePostCommand};
use post_errors::PostError;
use post_models::{Post, PostStatus, TagCount};
use post_queries::{PostQueryParams, aggregates, count_posts, filter_posts};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::{PostStore, config::MockStoreConfig, seed::seed_posts};

struct PostState {
    posts: Vec<Post>,
    next_id: i64,
}

impl PostState {
    fn new(posts: Vec<Post>) -> Self {
        let next_id = posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Self { posts, next_id }
    }

    fn position(&self, id: i64) -> Result<usize, PostError> {
        self.posts
            .iter()
            .position(|p| p.id == id)
            .ok_or(PostError::NotFound { post_id: id })
    }

    fn ensure_all_exist(&self, ids: &[i64]) -> Result<(), PostError> {
        ids.iter().try_for_each(|&id| self.position(id).map(|_| ()))
    }
}

/// In-process post store with simulated latency.
///
/// Newest posts sit at the head of the collection and ids are never
/// reused. Clones share the same collection.
#[derive(Clone)]
pub struct PostDao {
    state: Arc<RwLock<PostState>>,
    initial: Arc<Vec<Post>>,
    config: Arc<MockStoreConfig>,
}

impl PostDao {
    /// A store holding the standard twelve seed posts.
    pub fn new(config: MockStoreConfig) -> Self {
        Self::with_posts(seed_posts(), config)
    }

    pub fn with_posts(posts: Vec<Post>, config: MockStoreConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(PostState::new(posts.clone()))),
            initial: Arc::new(posts),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &MockStoreConfig { &self.config }

    /// Restores the initial collection and id allocator.
    #[instrument(skip(self))]
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        *state = PostState::new(self.initial.as_ref().clone());
        debug!("Post store reset to {} posts", state.posts.len());
    }

    pub async fn len(&self) -> usize { self.state.read().await.posts.len() }

    pub async fn is_empty(&self) -> bool { self.len().await == 0 }

    /// Snapshot of the live collection in store order.
    pub async fn snapshot(&self) -> Vec<Post> {
        self.state.read().await.posts.clone()
    }

    async fn simulate(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn merge(
        &self, id: i64, req: UpdatePostCommand,
    ) -> Result<Post, PostError> {
        req.validate()?;
        self.simulate(self.config.latency.update()).await;

        let mut state = self.state.write().await;
        let at = state.position(id)?;
        let post = &mut state.posts[at];
        req.apply(post, Utc::now());
        Ok(post.clone())
    }
}

#[async_trait]
impl GenericDao for PostDao {
    type CreateRequest = CreatePostCommand;
    type Error = PostError;
    type ID = i64;
    type Model = Post;
    type UpdateRequest = UpdatePostCommand;

    #[instrument(skip(self, _options))]
    async fn find_by_id(
        &self, id: i64, _options: &RequestOptions,
    ) -> Result<Post, PostError> {
        self.simulate(self.config.latency.get()).await;
        let state = self.state.read().await;
        let at = state.position(id)?;
        Ok(state.posts[at].clone())
    }

    #[instrument(skip(self, _options))]
    async fn all(&self, _options: &RequestOptions) -> Result<Vec<Post>, PostError> {
        self.simulate(self.config.latency.list()).await;
        Ok(self.snapshot().await)
    }

    #[instrument(skip(self, _options))]
    async fn create(
        &self, req: CreatePostCommand, _options: &RequestOptions,
    ) -> Result<Post, PostError> {
        req.validate()?;
        self.simulate(self.config.latency.create()).await;

        let excerpt = req
            .excerpt
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| self.config.excerpt.excerpt(&req.content));
        let (author_id, author_name) = match req.author_id {
            Some(id) => (id, req.author_name),
            None => {
                (
                    self.config.default_author_id,
                    req.author_name
                        .or_else(|| Some(self.config.default_author_name.clone())),
                )
            }
        };
        let now = Utc::now();

        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;
        let post = Post {
            id,
            title: req.title,
            content: req.content,
            excerpt: Some(excerpt),
            author_id,
            author_name,
            tags: req.tags.unwrap_or_default(),
            status: req.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(0, post.clone());
        debug!("Created post {}", id);
        Ok(post)
    }

    #[instrument(skip(self, req, _options))]
    async fn update(
        &self, id: i64, req: UpdatePostCommand, _options: &RequestOptions,
    ) -> Result<Post, PostError> {
        self.merge(id, req).await
    }

    #[instrument(skip(self, req, _options))]
    async fn patch(
        &self, id: i64, req: UpdatePostCommand, _options: &RequestOptions,
    ) -> Result<Post, PostError> {
        self.merge(id, req).await
    }

    #[instrument(skip(self, _options))]
    async fn delete(
        &self, id: i64, _options: &RequestOptions,
    ) -> Result<(), PostError> {
        self.simulate(self.config.latency.delete()).await;
        let mut state = self.state.write().await;
        let at = state.position(id)?;
        state.posts.remove(at);
        debug!("Deleted post {}", id);
        Ok(())
    }

    #[instrument(skip(self, _options))]
    async fn batch_delete(
        &self, ids: Vec<i64>, _options: &RequestOptions,
    ) -> Result<(), PostError> {
        self.simulate(self.config.latency.delete()).await;
        let mut state = self.state.write().await;
        state.ensure_all_exist(&ids)?;

        let doomed: HashSet<i64> = ids.into_iter().collect();
        state.posts.retain(|p| !doomed.contains(&p.id));
        debug!("Deleted {} posts", doomed.len());
        Ok(())
    }
}

#[async_trait]
impl PostStore for PostDao {
    #[instrument(skip(self, _options))]
    async fn list(
        &self, params: &PostQueryParams, _options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        self.simulate(self.config.latency.list()).await;
        let state = self.state.read().await;
        Ok(filter_posts(&state.posts, params))
    }

    #[instrument(skip(self, _options))]
    async fn count(
        &self, params: &PostQueryParams, _options: &RequestOptions,
    ) -> Result<usize, PostError> {
        self.simulate(self.config.latency.count()).await;
        let state = self.state.read().await;
        Ok(count_posts(&state.posts, params))
    }

    #[instrument(skip(self, _options))]
    async fn set_status(
        &self, id: i64, status: PostStatus, _options: &RequestOptions,
    ) -> Result<Post, PostError> {
        self.merge(id, UpdatePostCommand::status(status)).await
    }

    #[instrument(skip(self, _options))]
    async fn batch_update_status(
        &self, ids: Vec<i64>, status: PostStatus, _options: &RequestOptions,
    ) -> Result<(), PostError> {
        self.simulate(self.config.latency.update()).await;
        let mut state = self.state.write().await;
        state.ensure_all_exist(&ids)?;

        let now = Utc::now();
        for post in state.posts.iter_mut().filter(|p| ids.contains(&p.id)) {
            UpdatePostCommand::status(status).apply(post, now);
        }
        debug!("Set {} posts to {}", ids.len(), status);
        Ok(())
    }

    async fn popular(
        &self, limit: usize, _options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        self.simulate(self.config.latency.aggregate()).await;
        Ok(aggregates::popular(&self.state.read().await.posts, limit))
    }

    async fn latest(
        &self, limit: usize, _options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        self.simulate(self.config.latency.aggregate()).await;
        Ok(aggregates::latest(&self.state.read().await.posts, limit))
    }

    async fn recommended(
        &self, user_id: Option<i64>, limit: usize, _options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        self.simulate(self.config.latency.aggregate()).await;
        let posts = &self.state.read().await.posts;
        Ok(aggregates::recommended(posts, user_id, limit))
    }

    async fn all_tags(
        &self, _options: &RequestOptions,
    ) -> Result<Vec<String>, PostError> {
        self.simulate(self.config.latency.tags()).await;
        Ok(aggregates::all_tags(&self.state.read().await.posts))
    }

    async fn popular_tags(
        &self, limit: usize, _options: &RequestOptions,
    ) -> Result<Vec<TagCount>, PostError> {
        self.simulate(self.config.latency.tags()).await;
        Ok(aggregates::popular_tags(&self.state.read().await.posts, limit))
    }
}
