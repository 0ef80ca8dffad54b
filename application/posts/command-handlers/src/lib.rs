pub mod mutation;
pub mod plan;

use std::{future::Future, sync::Arc};

use database_traits::GenericDao;
use http_client::RequestOptions;
pub use mutation::{Mutation, MutationCallbacks, MutationStatus};
pub use plan::{CacheEffect, InvalidationPlan, MutationKind};
use post_commands::{
    BatchDeletePostsCommand, BatchUpdateStatusCommand, CreatePostCommand,
    UpdatePostCommand,
};
use post_dao::PostStore;
use post_errors::PostError;
use post_models::{Post, PostStatus};
use query_cache::QueryCache;
use tracing::{info, instrument, warn};

/// Write side for posts.
///
/// Every mutation runs against the store first; only when it succeeds is
/// the matching [`InvalidationPlan`] applied to the shared cache. A
/// failed or timed out mutation leaves the cache untouched.
pub struct PostMutationCoordinator<S> {
    store: Arc<S>,
    cache: QueryCache,
}

impl<S> Clone for PostMutationCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<S: PostStore> PostMutationCoordinator<S> {
    pub fn new(store: Arc<S>, cache: QueryCache) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &QueryCache { &self.cache }

    #[instrument(skip(self, options))]
    pub async fn create(
        &self, command: CreatePostCommand, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        let post = self
            .execute(MutationKind::Create, options, self.store.create(command, options))
            .await?;
        info!("Created post {}", post.id);
        self.settle(InvalidationPlan::saved(MutationKind::Create, &post))
            .await;
        Ok(post)
    }

    #[instrument(skip(self, options))]
    pub async fn update(
        &self, id: i64, command: UpdatePostCommand, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        let post = self
            .execute(
                MutationKind::Update,
                options,
                self.store.update(id, command, options),
            )
            .await?;
        self.settle(InvalidationPlan::saved(MutationKind::Update, &post))
            .await;
        Ok(post)
    }

    #[instrument(skip(self, options))]
    pub async fn patch(
        &self, id: i64, command: UpdatePostCommand, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        let post = self
            .execute(
                MutationKind::Patch,
                options,
                self.store.patch(id, command, options),
            )
            .await?;
        self.settle(InvalidationPlan::saved(MutationKind::Patch, &post))
            .await;
        Ok(post)
    }

    #[instrument(skip(self, options))]
    pub async fn publish(
        &self, id: i64, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        self.transition(MutationKind::Publish, id, PostStatus::Published, options)
            .await
    }

    #[instrument(skip(self, options))]
    pub async fn unpublish(
        &self, id: i64, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        self.transition(MutationKind::Unpublish, id, PostStatus::Draft, options)
            .await
    }

    #[instrument(skip(self, options))]
    pub async fn archive(
        &self, id: i64, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        self.transition(MutationKind::Archive, id, PostStatus::Archived, options)
            .await
    }

    #[instrument(skip(self, options))]
    pub async fn delete(
        &self, id: i64, options: &RequestOptions,
    ) -> Result<(), PostError> {
        self.execute(MutationKind::Delete, options, self.store.delete(id, options))
            .await?;
        info!("Deleted post {}", id);
        self.settle(InvalidationPlan::removed(MutationKind::Delete, &[id]))
            .await;
        Ok(())
    }

    #[instrument(skip(self, options))]
    pub async fn batch_delete(
        &self, command: BatchDeletePostsCommand, options: &RequestOptions,
    ) -> Result<(), PostError> {
        command.validate()?;
        let ids = command.ids;
        self.execute(
            MutationKind::BatchDelete,
            options,
            self.store.batch_delete(ids.clone(), options),
        )
        .await?;
        info!("Deleted {} posts", ids.len());
        self.settle(InvalidationPlan::removed(MutationKind::BatchDelete, &ids))
            .await;
        Ok(())
    }

    #[instrument(skip(self, options))]
    pub async fn batch_update_status(
        &self, command: BatchUpdateStatusCommand, options: &RequestOptions,
    ) -> Result<(), PostError> {
        command.validate()?;
        let BatchUpdateStatusCommand { ids, status } = command;
        self.execute(
            MutationKind::BatchUpdateStatus,
            options,
            self.store.batch_update_status(ids.clone(), status, options),
        )
        .await?;
        self.settle(InvalidationPlan::status_changed(&ids)).await;
        Ok(())
    }

    async fn transition(
        &self, kind: MutationKind, id: i64, status: PostStatus,
        options: &RequestOptions,
    ) -> Result<Post, PostError> {
        let post = self
            .execute(kind, options, self.store.set_status(id, status, options))
            .await?;
        self.settle(InvalidationPlan::saved(kind, &post)).await;
        Ok(post)
    }

    async fn execute<T, Fut>(
        &self, kind: MutationKind, options: &RequestOptions, operation: Fut,
    ) -> Result<T, PostError>
    where
        Fut: Future<Output = Result<T, PostError>>,
    {
        options
            .bounded(operation, PostError::Timeout)
            .await
            .inspect_err(|err| warn!("Post {} failed: {}", kind, err))
    }

    async fn settle(&self, plan: InvalidationPlan) {
        if let Err(err) = plan.apply(&self.cache).await {
            warn!("Cache update after {} failed: {}", plan.kind(), err);
        }
    }
}
