use std::sync::Arc;

use bytes::Bytes;
use log::{debug, error};
use redis::{AsyncCommands, aio::MultiplexedConnection};

use crate::{conf::ServerConfig, response::StoredResponse};

use super::{CacheStore, StoreError};

/// A Redis-backed cache store. The store name prefixes every key, so stores
/// under different names stay disjoint inside one Redis instance.
#[derive(Clone)]
pub struct RedisStore {
    name: String,
    client: Arc<redis::Client>,
}

impl RedisStore {
    pub fn from_config(config: &ServerConfig) -> Result<Self, StoreError> {
        let address = format!("redis://{}:{}", config.redis.address, config.redis.port);
        match redis::Client::open(address) {
            Ok(v) => Ok(Self {
                name: config.cache.name.clone(),
                client: Arc::new(v),
            }),
            Err(e) => {
                error!("Failed to set up the Redis store: {}", e);
                Err(StoreError::Connection)
            }
        }
    }

    fn key(&self, path: &str) -> String {
        format!("{}:{}", self.name, path)
    }

    /// The store name with glob metacharacters escaped, so a name like
    /// `cache-[v1]` cannot widen (or corrupt) a MATCH pattern.
    fn glob_escaped_name(&self) -> String {
        let mut escaped = String::with_capacity(self.name.len());
        for c in self.name.chars() {
            if matches!(c, '*' | '?' | '[' | ']' | '\\') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        debug!("Connecting to Redis...");
        match self.client.get_multiplexed_async_connection().await {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("Failed to create multiplexed async Redis connection: {}", e);
                Err(StoreError::Connection)
            }
        }
    }
}

impl CacheStore for RedisStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, path: &str) -> Result<Option<StoredResponse>, StoreError> {
        let mut conn = self.connection().await?;

        let key = self.key(path);
        let fields: (Option<u16>, Option<String>, Option<Vec<u8>>) =
            match conn
                .hget(&key, ["status", "content_type", "body"].as_slice())
                .await
            {
                Ok(v) => v,
                Err(e) => {
                    error!("Failed to read \"{}\" from Redis: {}", key, e);
                    return Err(StoreError::Operation(e.to_string()));
                }
            };

        match fields {
            (Some(status), content_type, Some(body)) => Ok(Some(StoredResponse::new(
                status,
                content_type,
                Bytes::from(body),
            ))),
            _ => Ok(None),
        }
    }

    async fn insert_all(&self, entries: Vec<(String, StoredResponse)>) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;

        // MULTI/EXEC, so a bulk insert lands as a whole or not at all.
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (path, response) in &entries {
            let key = self.key(path);
            pipe.hset(&key, "status", response.status()).ignore();
            match response.content_type() {
                Some(v) => {
                    pipe.hset(&key, "content_type", v).ignore();
                }
                None => {
                    pipe.hdel(&key, "content_type").ignore();
                }
            }
            pipe.hset(&key, "body", response.body().as_ref()).ignore();
        }

        match pipe.query_async::<()>(&mut conn).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to commit {} entries to Redis: {}", entries.len(), e);
                Err(StoreError::Operation(e.to_string()))
            }
        }
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let mut conn = self.connection().await?;

        // Cursored SCAN rather than KEYS, which blocks a shared Redis
        let pattern = format!("{}:*", self.glob_escaped_name());
        let mut cursor: u64 = 0;
        let mut count = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = match redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
            {
                Ok(v) => v,
                Err(e) => {
                    error!("Failed to count Redis store entries: {}", e);
                    return Err(StoreError::Operation(e.to_string()));
                }
            };

            count += keys.len();
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(count)
    }
}
