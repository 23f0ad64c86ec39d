use std::{env, sync::LazyLock};

use super::types::{CacheStore, InMemoryCacheStore, RedisCacheStore};
use crate::storage::errors::StorageError;

pub static GENERIC_CACHE_STORE_TYPE: LazyLock<String> = LazyLock::new(|| {
    env::var("GENERIC_CACHE_STORE_TYPE").unwrap_or_else(|_| "memory".to_string())
});

pub static GENERIC_CACHE_STORE_URL: LazyLock<String> = LazyLock::new(|| {
    env::var("GENERIC_CACHE_STORE_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
});

/// Builds the cache store selected by `GENERIC_CACHE_STORE_TYPE` and verifies
/// that it is reachable.
pub async fn cache_store_from_env() -> Result<Box<dyn CacheStore>, StorageError> {
    build_cache_store(
        GENERIC_CACHE_STORE_TYPE.as_str(),
        GENERIC_CACHE_STORE_URL.as_str(),
    )
    .await
}

pub(super) async fn build_cache_store(
    store_type: &str,
    store_url: &str,
) -> Result<Box<dyn CacheStore>, StorageError> {
    tracing::info!("Initializing cache store with type: {}", store_type);

    let store: Box<dyn CacheStore> = match store_type {
        "memory" => Box::new(InMemoryCacheStore::new()),
        "redis" => {
            let client = redis::Client::open(store_url).map_err(|e| {
                tracing::error!("Failed to create Redis client: {}", e);
                StorageError::from(e)
            })?;
            Box::new(RedisCacheStore { client })
        }
        t => return Err(StorageError::UnsupportedStoreType(t.to_string())),
    };

    store.init().await.inspect_err(|e| {
        tracing::error!("Failed to connect to cache store: {}", e);
    })?;

    tracing::info!("Connected to cache store: type={}", store_type);
    Ok(store)
}
