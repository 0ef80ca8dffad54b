use std::time::Duration;

use http_client::RetryPolicy;
use serde::Deserialize;

/// How long each query family is served from cache before a refetch,
/// in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaleTimes {
    #[serde(default = "default_detail")]
    pub detail: u64,
    #[serde(default = "default_list")]
    pub list: u64,
    #[serde(default = "default_author")]
    pub author: u64,
    #[serde(default = "default_tags")]
    pub tags: u64,
    #[serde(default = "default_search")]
    pub search: u64,
    #[serde(default = "default_popular")]
    pub popular: u64,
    #[serde(default = "default_latest")]
    pub latest: u64,
    #[serde(default = "default_all_tags")]
    pub all_tags: u64,
    #[serde(default = "default_popular_tags")]
    pub popular_tags: u64,
    #[serde(default = "default_count")]
    pub count: u64,
    #[serde(default = "default_recommended")]
    pub recommended: u64,
}

fn default_detail() -> u64 { 5 * 60 }
fn default_list() -> u64 { 2 * 60 }
fn default_author() -> u64 { 3 * 60 }
fn default_tags() -> u64 { 3 * 60 }
fn default_search() -> u64 { 60 }
fn default_popular() -> u64 { 10 * 60 }
fn default_latest() -> u64 { 2 * 60 }
fn default_all_tags() -> u64 { 30 * 60 }
fn default_popular_tags() -> u64 { 15 * 60 }
fn default_count() -> u64 { 2 * 60 }
fn default_recommended() -> u64 { 5 * 60 }

impl Default for StaleTimes {
    fn default() -> Self {
        Self {
            detail: default_detail(),
            list: default_list(),
            author: default_author(),
            tags: default_tags(),
            search: default_search(),
            popular: default_popular(),
            latest: default_latest(),
            all_tags: default_all_tags(),
            popular_tags: default_popular_tags(),
            count: default_count(),
            recommended: default_recommended(),
        }
    }
}

pub(crate) fn secs(value: u64) -> Duration { Duration::from_secs(value) }

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub stale_times: StaleTimes,
    /// Backoff used when a call asks for retries; the retry count comes
    /// from the call's options.
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

fn default_page_size() -> u32 { 10 }

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_times: StaleTimes::default(),
            retry: RetryPolicy::default(),
            default_page_size: default_page_size(),
        }
    }
}
