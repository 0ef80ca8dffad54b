use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn token(&self) -> Option<String>;

    async fn set_token(&self, token: Option<String>);

    /// Called by the client when the server answers 401.
    async fn clear(&self) { self.set_token(None).await }
}

/// In-process bearer token holder.
#[derive(Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(Some(token.into()))),
        }
    }
}

#[async_trait]
impl AuthProvider for TokenStore {
    async fn token(&self) -> Option<String> { self.token.read().await.clone() }

    async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_store_set_and_clear() {
        let store = TokenStore::new();
        assert_eq!(store.token().await, None);

        store.set_token(Some("abc".to_string())).await;
        assert_eq!(store.token().await.as_deref(), Some("abc"));

        store.clear().await;
        assert_eq!(store.token().await, None);
    }

    #[tokio::test]
    async fn test_clones_share_token() {
        let store = TokenStore::with_token("shared");
        let other = store.clone();

        other.clear().await;

        assert_eq!(store.token().await, None);
    }
}
