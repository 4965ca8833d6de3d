//! The named cache store: a key-value mapping from request path to a stored
//! response. The store name acts as a version tag, so two stores with
//! different names never see each other's entries.

use std::fmt::Display;

use crate::{conf::ServerConfig, response::StoredResponse};

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

#[derive(Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The store backend could not be reached.
    Connection,
    /// The backend answered, but the operation went wrong.
    Operation(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection => f.write_str("Store connection error"),
            Self::Operation(v) => write!(f, "Store operation error: {}", v),
        }
    }
}

/// A named cache store. Absence of an entry is a valid lookup outcome, not
/// an error; errors mean the backend itself misbehaved.
pub trait CacheStore {
    /// The name this store was opened under.
    fn name(&self) -> &str;

    #[allow(async_fn_in_trait)]
    async fn lookup(&self, path: &str) -> Result<Option<StoredResponse>, StoreError>;

    /// Inserts every entry in one atomic step: either all land or none do.
    /// Existing entries under the same paths are overwritten.
    #[allow(async_fn_in_trait)]
    async fn insert_all(&self, entries: Vec<(String, StoredResponse)>) -> Result<(), StoreError>;

    #[allow(async_fn_in_trait)]
    async fn len(&self) -> Result<usize, StoreError>;
}

/* -------------------------------------------------------------------------- */
/*                              Backend Dispatch                              */
/* -------------------------------------------------------------------------- */

#[derive(Clone)]
pub enum StoreBackend {
    Memory(memory::MemoryStore),
    #[cfg(feature = "redis")]
    Redis(redis::RedisStore),
}

impl StoreBackend {
    pub fn from_config(config: &ServerConfig) -> Result<Self, StoreError> {
        #[cfg(feature = "redis")]
        if config.redis.enabled {
            return Ok(Self::Redis(redis::RedisStore::from_config(config)?));
        }

        #[cfg(not(feature = "redis"))]
        if config.redis.enabled {
            log::error!("Redis store requested, but this build carries no redis support");
            return Err(StoreError::Connection);
        }

        Ok(Self::Memory(memory::MemoryStore::open(&config.cache.name)))
    }
}

impl CacheStore for StoreBackend {
    fn name(&self) -> &str {
        match self {
            Self::Memory(v) => v.name(),
            #[cfg(feature = "redis")]
            Self::Redis(v) => v.name(),
        }
    }

    async fn lookup(&self, path: &str) -> Result<Option<StoredResponse>, StoreError> {
        match self {
            Self::Memory(v) => v.lookup(path).await,
            #[cfg(feature = "redis")]
            Self::Redis(v) => v.lookup(path).await,
        }
    }

    async fn insert_all(&self, entries: Vec<(String, StoredResponse)>) -> Result<(), StoreError> {
        match self {
            Self::Memory(v) => v.insert_all(entries).await,
            #[cfg(feature = "redis")]
            Self::Redis(v) => v.insert_all(entries).await,
        }
    }

    async fn len(&self) -> Result<usize, StoreError> {
        match self {
            Self::Memory(v) => v.len().await,
            #[cfg(feature = "redis")]
            Self::Redis(v) => v.len().await,
        }
    }
}
