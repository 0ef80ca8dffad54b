use std::time::Duration;

use post_models::ExcerptPolicy;
use serde::Deserialize;

/// Simulated round-trip delays of the in-memory store, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LatencyConfig {
    #[serde(default = "default_list_ms")]
    pub list_ms: u64,
    #[serde(default = "default_get_ms")]
    pub get_ms: u64,
    #[serde(default = "default_create_ms")]
    pub create_ms: u64,
    #[serde(default = "default_update_ms")]
    pub update_ms: u64,
    #[serde(default = "default_delete_ms")]
    pub delete_ms: u64,
    #[serde(default = "default_count_ms")]
    pub count_ms: u64,
    #[serde(default = "default_aggregate_ms")]
    pub aggregate_ms: u64,
    #[serde(default = "default_tags_ms")]
    pub tags_ms: u64,
}

fn default_list_ms() -> u64 { 300 }
fn default_get_ms() -> u64 { 200 }
fn default_create_ms() -> u64 { 500 }
fn default_update_ms() -> u64 { 400 }
fn default_delete_ms() -> u64 { 300 }
fn default_count_ms() -> u64 { 100 }
fn default_aggregate_ms() -> u64 { 300 }
fn default_tags_ms() -> u64 { 200 }

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            list_ms: default_list_ms(),
            get_ms: default_get_ms(),
            create_ms: default_create_ms(),
            update_ms: default_update_ms(),
            delete_ms: default_delete_ms(),
            count_ms: default_count_ms(),
            aggregate_ms: default_aggregate_ms(),
            tags_ms: default_tags_ms(),
        }
    }
}

impl LatencyConfig {
    /// No simulated delay at all.
    pub fn none() -> Self { Self::uniform(0) }

    pub fn uniform(ms: u64) -> Self {
        Self {
            list_ms: ms,
            get_ms: ms,
            create_ms: ms,
            update_ms: ms,
            delete_ms: ms,
            count_ms: ms,
            aggregate_ms: ms,
            tags_ms: ms,
        }
    }

    pub fn list(&self) -> Duration { Duration::from_millis(self.list_ms) }

    pub fn get(&self) -> Duration { Duration::from_millis(self.get_ms) }

    pub fn create(&self) -> Duration { Duration::from_millis(self.create_ms) }

    pub fn update(&self) -> Duration { Duration::from_millis(self.update_ms) }

    pub fn delete(&self) -> Duration { Duration::from_millis(self.delete_ms) }

    pub fn count(&self) -> Duration { Duration::from_millis(self.count_ms) }

    pub fn aggregate(&self) -> Duration {
        Duration::from_millis(self.aggregate_ms)
    }

    pub fn tags(&self) -> Duration { Duration::from_millis(self.tags_ms) }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MockStoreConfig {
    #[serde(default)]
    pub latency: LatencyConfig,
    #[serde(default)]
    pub excerpt: ExcerptPolicy,
    #[serde(default = "default_author_id")]
    pub default_author_id: i64,
    #[serde(default = "default_author_name")]
    pub default_author_name: String,
}

fn default_author_id() -> i64 { 1 }
fn default_author_name() -> String { "Current User".to_string() }

impl Default for MockStoreConfig {
    fn default() -> Self {
        Self {
            latency: LatencyConfig::default(),
            excerpt: ExcerptPolicy::default(),
            default_author_id: default_author_id(),
            default_author_name: default_author_name(),
        }
    }
}

impl MockStoreConfig {
    pub fn without_latency() -> Self {
        Self {
            latency: LatencyConfig::none(),
            ..Self::default()
        }
    }
}
