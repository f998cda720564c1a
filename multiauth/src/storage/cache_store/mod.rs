mod config;
mod memory;
mod redis;
mod types;

pub use config::{cache_store_from_env, new_cache_store};
pub use types::{CacheStore, InMemoryCacheStore, RedisCacheStore};
