#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries; `None` keeps the cache unbounded.
    #[serde(default)]
    pub capacity: Option<u64>,
}

impl CacheConfig {
    pub fn unbounded() -> Self { Self { capacity: None } }

    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            capacity: Some(capacity),
        }
    }
}
