// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory durable store

use crate::error::StorageError;
use crate::store::DurableStore;
use async_trait::async_trait;
use rewind_core::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Durable store backed by a map; clones share the same contents
#[derive(Debug)]
pub struct MemoryStore<V> {
    entries: Arc<Mutex<BTreeMap<u64, Entry<V>>>>,
}

impl<V> Clone for MemoryStore<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<V> DurableStore<V> for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn put(&self, entry: Entry<V>) -> Result<(), StorageError> {
        self.entries.lock().await.insert(entry.key(), entry);
        Ok(())
    }

    async fn get(&self, key: u64) -> Result<Option<Entry<V>>, StorageError> {
        Ok(self.entries.lock().await.get(&key).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Entry<V>>, StorageError> {
        Ok(self.entries.lock().await.values().cloned().collect())
    }

    async fn remove(&self, keys: &[u64]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.entries.lock().await.clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize, StorageError> {
        Ok(self.entries.lock().await.len())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
