mod cache_store;
mod errors;
mod types;

pub use cache_store::{
    CacheStore, GENERIC_CACHE_STORE_TYPE, GENERIC_CACHE_STORE_URL, InMemoryCacheStore,
    RedisCacheStore, cache_store_from_env,
};
pub use errors::StorageError;
pub use types::CacheData;
