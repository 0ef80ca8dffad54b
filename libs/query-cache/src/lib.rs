pub mod cache;
pub mod config;
pub mod key;

pub use cache::{CacheError, CacheResult, EntryState, FetchTicket, QueryCache};
pub use config::CacheConfig;
pub use key::{KeySegment, QueryKey};
