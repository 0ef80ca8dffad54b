use std::{borrow::Cow, fmt::Display, marker::PhantomData};

use async_trait::async_trait;
use common_errors::{AppError, AppResult, ErrorKind};
use http_client::{ApiClient, Method, RequestOptions};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use url::form_urlencoded;

use crate::dao::GenericDao;

/// Encodes `pairs` as `?k=v&k=v`, or an empty string when there are none.
pub fn query_string<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (name, value) in pairs {
        serializer.append_pair(name, &value);
        any = true;
    }
    if any {
        format!("?{}", serializer.finish())
    }
    else {
        String::new()
    }
}

/// Generic CRUD over a REST collection rooted at `base_path`.
///
/// Resource-specific services wrap one of these and add their own
/// endpoints instead of extending a base type.
pub struct RestDao<M, C, U, I = i64> {
    client: ApiClient,
    base_path: Cow<'static, str>,
    _marker: PhantomData<fn() -> (M, C, U, I)>,
}

impl<M, C, U, I> Clone for RestDao<M, C, U, I> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_path: self.base_path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M, C, U, I> RestDao<M, C, U, I> {
    pub fn new(
        client: ApiClient, base_path: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            client,
            base_path: base_path.into(),
            _marker: PhantomData,
        }
    }

    pub fn client(&self) -> &ApiClient { &self.client }

    pub fn base_path(&self) -> &str { &self.base_path }

    /// `base_path` joined with `suffix`.
    pub fn path(&self, suffix: impl Display) -> String {
        format!("{}/{}", self.base_path, suffix)
    }

    pub async fn count(
        &self, query: &str, options: &RequestOptions,
    ) -> AppResult<u64> {
        #[derive(serde::Deserialize)]
        struct Count {
            count: u64,
        }
        let path = format!("{}{}", self.path("count"), query);
        let count: Count = self.client.get(&path, options).await?;
        Ok(count.count)
    }
}

impl<M, C, U, I> RestDao<M, C, U, I>
where
    M: DeserializeOwned + Send + Sync + 'static,
    I: Display + Send + Sync + 'static,
{
    /// `false` only when the server answers 404.
    pub async fn exists(
        &self, id: I, options: &RequestOptions,
    ) -> AppResult<bool> {
        match self.client.get::<M>(&self.path(id), options).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl<M, C, U, I> GenericDao for RestDao<M, C, U, I>
where
    M: DeserializeOwned + Send + Sync + 'static,
    C: Serialize + Send + Sync + 'static,
    U: Serialize + Send + Sync + 'static,
    I: Serialize
        + DeserializeOwned
        + Display
        + Copy
        + Send
        + Sync
        + 'static,
{
    type CreateRequest = C;
    type Error = AppError;
    type ID = I;
    type Model = M;
    type UpdateRequest = U;

    async fn find_by_id(
        &self, id: I, options: &RequestOptions,
    ) -> AppResult<M> {
        self.client.get(&self.path(id), options).await
    }

    async fn all(&self, options: &RequestOptions) -> AppResult<Vec<M>> {
        self.client.get(&self.base_path, options).await
    }

    async fn create(&self, req: C, options: &RequestOptions) -> AppResult<M> {
        self.client.post(&self.base_path, &req, options).await
    }

    async fn update(
        &self, id: I, req: U, options: &RequestOptions,
    ) -> AppResult<M> {
        self.client.put(&self.path(id), &req, options).await
    }

    async fn patch(
        &self, id: I, req: U, options: &RequestOptions,
    ) -> AppResult<M> {
        self.client.patch(&self.path(id), &req, options).await
    }

    async fn delete(&self, id: I, options: &RequestOptions) -> AppResult<()> {
        self.client.delete(&self.path(id), options).await
    }

    async fn batch_delete(
        &self, ids: Vec<I>, options: &RequestOptions,
    ) -> AppResult<()> {
        self.client
            .execute(
                Method::POST,
                &self.path("batch-delete"),
                Some(json!({ "ids": ids })),
                options,
            )
            .await
    }
}
