use std::{env, sync::LazyLock};

use crate::storage::errors::StorageError;

use super::types::{CacheStore, InMemoryCacheStore, RedisCacheStore};

/// "memory" or "redis". Default: "memory"
static GENERIC_CACHE_STORE_TYPE: LazyLock<String> = LazyLock::new(|| {
    env::var("GENERIC_CACHE_STORE_TYPE").unwrap_or_else(|_| "memory".to_string())
});

static GENERIC_CACHE_STORE_URL: LazyLock<String> =
    LazyLock::new(|| env::var("GENERIC_CACHE_STORE_URL").unwrap_or_default());

/// Build the cache store selected by `GENERIC_CACHE_STORE_TYPE` / `GENERIC_CACHE_STORE_URL`.
pub async fn cache_store_from_env() -> Result<Box<dyn CacheStore>, StorageError> {
    new_cache_store(&GENERIC_CACHE_STORE_TYPE, &GENERIC_CACHE_STORE_URL).await
}

/// Build and initialize a cache store. Redis connectivity is verified up front.
pub async fn new_cache_store(
    store_type: &str,
    store_url: &str,
) -> Result<Box<dyn CacheStore>, StorageError> {
    tracing::info!("Initializing cache store with type: {}", store_type);

    let store: Box<dyn CacheStore> = match store_type {
        "memory" => Box::new(InMemoryCacheStore::new()),
        "redis" => Box::new(RedisCacheStore::new(store_url)?),
        t => {
            tracing::error!("Unsupported cache store type: {}", t);
            return Err(StorageError::UnsupportedType(format!(
                "{t}. Supported types are 'memory' and 'redis'"
            )));
        }
    };

    if let Err(e) = store.init().await {
        tracing::error!("Failed to initialize cache store: {}", e);
        return Err(e);
    }

    tracing::info!("Connected to cache store: type={}", store_type);
    Ok(store)
}
