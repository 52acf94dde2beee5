// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable store trait

use crate::error::StorageError;
use async_trait::async_trait;
use rewind_core::Entry;

/// Authoritative, unbounded entry store keyed by insertion index
///
/// Every accepted entry is written here regardless of what the fast window
/// keeps. `put` on an existing key overwrites it.
#[async_trait]
pub trait DurableStore<V>: Send + Sync
where
    V: Send + Sync + 'static,
{
    async fn put(&self, entry: Entry<V>) -> Result<(), StorageError>;

    async fn get(&self, key: u64) -> Result<Option<Entry<V>>, StorageError>;

    /// Every entry, ordered by insertion index
    async fn get_all(&self) -> Result<Vec<Entry<V>>, StorageError>;

    /// Delete entries; missing keys are ignored
    async fn remove(&self, keys: &[u64]) -> Result<(), StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;

    async fn len(&self) -> Result<usize, StorageError>;

    async fn put_all(&self, entries: Vec<Entry<V>>) -> Result<(), StorageError> {
        for entry in entries {
            self.put(entry).await?;
        }
        Ok(())
    }
}
