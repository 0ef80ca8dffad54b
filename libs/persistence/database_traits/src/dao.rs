use async_trait::async_trait;
use http_client::RequestOptions;
use serde::{Serialize, de::DeserializeOwned};

/// CRUD operations over one resource type. Implementations are either
/// in-process stores or remote services reached through a transport.
#[async_trait]
pub trait GenericDao {
    type Model: Send + Sync + 'static;
    type CreateRequest: Send + Sync + 'static;
    type UpdateRequest: Send + Sync + 'static;
    type Error: Send + 'static;
    type ID: Serialize + DeserializeOwned + Copy + Send + Sync + 'static;

    async fn find_by_id(
        &self, id: Self::ID, options: &RequestOptions,
    ) -> Result<Self::Model, Self::Error>;

    async fn all(
        &self, options: &RequestOptions,
    ) -> Result<Vec<Self::Model>, Self::Error>;

    async fn create(
        &self, req: Self::CreateRequest, options: &RequestOptions,
    ) -> Result<Self::Model, Self::Error>;

    /// Full replacement of the mutable fields present in `req`.
    async fn update(
        &self, id: Self::ID, req: Self::UpdateRequest,
        options: &RequestOptions,
    ) -> Result<Self::Model, Self::Error>;

    /// Partial update; fields absent from `req` are preserved.
    async fn patch(
        &self, id: Self::ID, req: Self::UpdateRequest,
        options: &RequestOptions,
    ) -> Result<Self::Model, Self::Error>;

    async fn delete(
        &self, id: Self::ID, options: &RequestOptions,
    ) -> Result<(), Self::Error>;

    async fn batch_delete(
        &self, ids: Vec<Self::ID>, options: &RequestOptions,
    ) -> Result<(), Self::Error>;
}
