use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::response::StoredResponse;

use super::{CacheStore, StoreError};

/// An in-process cache store. Clones share the same map, so every server
/// worker sees one store per name.
#[derive(Clone)]
pub struct MemoryStore {
    name: String,
    data: Arc<RwLock<HashMap<String, StoredResponse>>>,
}

impl MemoryStore {
    pub fn open(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, path: &str) -> Result<Option<StoredResponse>, StoreError> {
        match self.data.read() {
            Ok(map) => Ok(map.get(path).cloned()),
            Err(_) => Err(StoreError::Operation("store lock poisoned".to_string())),
        }
    }

    async fn insert_all(&self, entries: Vec<(String, StoredResponse)>) -> Result<(), StoreError> {
        // One write-lock section, so the bulk insert lands as a whole.
        match self.data.write() {
            Ok(mut map) => {
                for (path, response) in entries {
                    map.insert(path, response);
                }
                Ok(())
            }
            Err(_) => Err(StoreError::Operation("store lock poisoned".to_string())),
        }
    }

    async fn len(&self) -> Result<usize, StoreError> {
        match self.data.read() {
            Ok(map) => Ok(map.len()),
            Err(_) => Err(StoreError::Operation("store lock poisoned".to_string())),
        }
    }
}
