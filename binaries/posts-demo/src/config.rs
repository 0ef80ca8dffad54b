use std::path::Path;

use anyhow::Context;
use post_dao::{LatencyConfig, MockStoreConfig};
use post_query_handlers::QueryConfig;
use query_cache::CacheConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub store: MockStoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

impl DemoConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path
        else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))
    }

    pub fn with_latency(mut self, latency_ms: Option<u64>) -> Self {
        if let Some(ms) = latency_ms {
            self.store.latency = LatencyConfig::uniform(ms);
        }
        self
    }
}
