use async_trait::async_trait;
use database_traits::{GenericDao, RestDao, query_string};
use http_client::{ApiClient, Method, RequestOptions};
use post_commands::{
    BatchUpdateStatusCommand, CreatePostCommand, UpdatePostCommand,
};
use post_errors::PostError;
use post_models::{Post, PostStatus, TagCount};
use post_queries::PostQueryParams;
use serde_json::json;
use tracing::instrument;

use crate::PostStore;

pub const POSTS_PATH: &str = "/posts";

/// Post store backed by the remote posts API.
#[derive(Clone)]
pub struct RemotePostDao {
    rest: RestDao<Post, CreatePostCommand, UpdatePostCommand>,
}

impl RemotePostDao {
    pub fn new(client: ApiClient) -> Self {
        Self {
            rest: RestDao::new(client, POSTS_PATH),
        }
    }

    async fn get<R: serde::de::DeserializeOwned>(
        &self, path: &str, options: &RequestOptions,
    ) -> Result<R, PostError> {
        Ok(self.rest.client().get(path, options).await?)
    }

    async fn transition(
        &self, id: i64, action: &str, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        let path = self.rest.path(format!("{id}/{action}"));
        Ok(self.rest.client().patch(&path, &json!({}), options).await?)
    }
}

#[async_trait]
impl GenericDao for RemotePostDao {
    type CreateRequest = CreatePostCommand;
    type Error = PostError;
    type ID = i64;
    type Model = Post;
    type UpdateRequest = UpdatePostCommand;

    async fn find_by_id(
        &self, id: i64, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        Ok(self.rest.find_by_id(id, options).await?)
    }

    async fn all(&self, options: &RequestOptions) -> Result<Vec<Post>, PostError> {
        Ok(self.rest.all(options).await?)
    }

    #[instrument(skip(self, options))]
    async fn create(
        &self, req: CreatePostCommand, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        req.validate()?;
        Ok(self.rest.create(req, options).await?)
    }

    #[instrument(skip(self, req, options))]
    async fn update(
        &self, id: i64, req: UpdatePostCommand, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        req.validate()?;
        Ok(self.rest.update(id, req, options).await?)
    }

    #[instrument(skip(self, req, options))]
    async fn patch(
        &self, id: i64, req: UpdatePostCommand, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        req.validate()?;
        Ok(self.rest.patch(id, req, options).await?)
    }

    #[instrument(skip(self, options))]
    async fn delete(
        &self, id: i64, options: &RequestOptions,
    ) -> Result<(), PostError> {
        Ok(self.rest.delete(id, options).await?)
    }

    #[instrument(skip(self, options))]
    async fn batch_delete(
        &self, ids: Vec<i64>, options: &RequestOptions,
    ) -> Result<(), PostError> {
        Ok(self.rest.batch_delete(ids, options).await?)
    }
}

#[async_trait]
impl PostStore for RemotePostDao {
    #[instrument(skip(self, options))]
    async fn list(
        &self, params: &PostQueryParams, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        let path =
            format!("{}{}", POSTS_PATH, query_string(params.to_query_pairs()));
        self.get(&path, options).await
    }

    async fn count(
        &self, params: &PostQueryParams, options: &RequestOptions,
    ) -> Result<usize, PostError> {
        let query = query_string(params.without_pagination().to_query_pairs());
        let count = self.rest.count(&query, options).await?;
        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }

    async fn set_status(
        &self, id: i64, status: PostStatus, options: &RequestOptions,
    ) -> Result<Post, PostError> {
        match status {
            PostStatus::Published => self.transition(id, "publish", options).await,
            PostStatus::Draft => self.transition(id, "unpublish", options).await,
            PostStatus::Archived => self.transition(id, "archive", options).await,
        }
    }

    #[instrument(skip(self, options))]
    async fn batch_update_status(
        &self, ids: Vec<i64>, status: PostStatus, options: &RequestOptions,
    ) -> Result<(), PostError> {
        let body = serde_json::to_value(BatchUpdateStatusCommand { ids, status })
            .map_err(common_errors::AppError::from)?;
        self.rest
            .client()
            .execute(
                Method::POST,
                &self.rest.path("batch-status"),
                Some(body),
                options,
            )
            .await?;
        Ok(())
    }

    async fn popular(
        &self, limit: usize, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        self.get(&self.rest.path(format!("popular?limit={limit}")), options)
            .await
    }

    async fn latest(
        &self, limit: usize, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        self.get(&self.rest.path(format!("latest?limit={limit}")), options)
            .await
    }

    async fn recommended(
        &self, user_id: Option<i64>, limit: usize, options: &RequestOptions,
    ) -> Result<Vec<Post>, PostError> {
        let mut pairs = vec![("limit", limit.to_string())];
        if let Some(user_id) = user_id {
            pairs.push(("userId", user_id.to_string()));
        }
        let path = self.rest.path(format!("recommended{}", query_string(pairs)));
        self.get(&path, options).await
    }

    async fn all_tags(
        &self, options: &RequestOptions,
    ) -> Result<Vec<String>, PostError> {
        self.get(&self.rest.path("tags/all"), options).await
    }

    async fn popular_tags(
        &self, limit: usize, options: &RequestOptions,
    ) -> Result<Vec<TagCount>, PostError> {
        self.get(
            &self.rest.path(format!("tags/popular?limit={limit}")),
            options,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http_client::TokenStore;
    use test_utils::{StubTransport, published};

    use super::*;

    fn remote(transport: &StubTransport) -> RemotePostDao {
        RemotePostDao::new(ApiClient::new(
            Arc::new(transport.clone()),
            Arc::new(TokenStore::new()),
        ))
    }

    #[tokio::test]
    async fn test_batch_delete_posts_ids() {
        let transport = StubTransport::new();

        remote(&transport)
            .batch_delete(vec![3, 4], &RequestOptions::new())
            .await
            .unwrap();

        let sent = transport.last().unwrap();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.path, "/posts/batch-delete");
        assert_eq!(sent.body, Some(json!({"ids": [3, 4]})));
    }

    #[tokio::test]
    async fn test_recommended_sends_user_only_when_known() {
        let transport = StubTransport::new();
        transport.ok(&vec![published(2)]).ok(&vec![published(5)]);
        let store = remote(&transport);

        store.recommended(Some(9), 4, &RequestOptions::new()).await.unwrap();
        let anyone = store.recommended(None, 4, &RequestOptions::new()).await.unwrap();

        let paths: Vec<String> =
            transport.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec!["/posts/recommended?limit=4&userId=9", "/posts/recommended?limit=4"]
        );
        assert_eq!(anyone[0].id, 5);
    }
}
