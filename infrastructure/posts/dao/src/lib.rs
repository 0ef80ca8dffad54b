pub mod config;
pub mod memory;
pub mod placeholder;
pub mod remote;
pub mod seed;

use async_trait::async_trait;
pub use config::{LatencyConfig, MockStoreConfig};
use database_traits::GenericDao;
use http_client::RequestOptions;
pub use memory::PostDao;
pub use placeholder::{JsonPlaceholderPost, JsonPlaceholderUser, adapt_posts};
use post_commands::{CreatePostCommand, UpdatePostCommand};
use post_errors::PostError;
use post_models::{Post, PostStatus, TagCount};
use post_queries::PostQueryParams;
pub use remote::RemotePostDao;
pub use seed::seed_posts;

/// Every operation the post handlers need from a backing store.
///
/// CRUD comes from [`GenericDao`]; listing, status transitions and the
/// aggregate reads are post specific.
#[async_trait]
pub trait PostStore:
    GenericDao<
        Model = Post,
        ID = i64,
        CreateRequest = CreatePostCommand,
        UpdateRequest = UpdatePostCommand,
        Error = PostError,
    > + Send
    + Sync
{
    async fn list(
        &self, params: &PostQueryParams, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError>;

    /// Matches for `params`, ignoring pagination.
    async fn count(
        &self, params: &PostQueryParams, options: &RequestOptions,
    ) -> Result<usize, PostError>;

    async fn set_status(
        &self, id: i64, status: PostStatus, options: &RequestOptions,
    ) -> Result<Post, PostError>;

    async fn publish(
        &self, id: i64, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        self.set_status(id, PostStatus::Published, options).await
    }

    async fn unpublish(
        &self, id: i64, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        self.set_status(id, PostStatus::Draft, options).await
    }

    async fn archive(
        &self, id: i64, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        self.set_status(id, PostStatus::Archived, options).await
    }

    async fn batch_update_status(
        &self, ids: Vec<i64>, status: PostStatus, options: &RequestOptions,
    ) -> Result<(), PostError>;

    async fn popular(
        &self, limit: usize, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError>;

    async fn latest(
        &self, limit: usize, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError>;

    /// Posts picked for `user_id`; the newest posts when nobody is signed in.
    async fn recommended(
        &self, user_id: Option<i64>, limit: usize, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError>;

    async fn all_tags(
        &self, options: &RequestOptions,
    ) -> Result<Vec<String>, PostError>;

    async fn popular_tags(
        &self, limit: usize, options: &RequestOptions,
    ) -> Result<Vec<TagCount>, PostError>;
}
