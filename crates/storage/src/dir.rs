// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory-backed durable store
//!
//! One file per entry, named by its zero-padded insertion index:
//!
//! ```text
//! <dir>/00000000000000000000.json
//! <dir>/00000000000000000001.json
//! ```
//!
//! Writes go to a temporary file that is fsync'd and then renamed over the
//! target, so a reader never observes a half-written record.

use crate::error::StorageError;
use crate::record::StoredRecord;
use crate::store::DurableStore;
use async_trait::async_trait;
use rewind_core::Entry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const EXTENSION: &str = "json";

/// Durable store writing checksummed JSON records into a directory
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Open a store at the given directory, creating it if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "opened durable store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: u64) -> PathBuf {
        self.dir.join(format!("{:020}.{}", key, EXTENSION))
    }

    fn key_of(path: &Path) -> Option<u64> {
        if path.extension()? != EXTENSION {
            return None;
        }
        path.file_stem()?.to_str()?.parse().ok()
    }

    async fn keys(&self) -> Result<Vec<u64>, StorageError> {
        let mut keys = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(item) = dir.next_entry().await? {
            if let Some(key) = Self::key_of(&item.path()) {
                keys.push(key);
            }
        }
        keys.sort_unstable();
        Ok(keys)
    }

    async fn read_record(&self, key: u64) -> Result<Option<StoredRecord>, StorageError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(StoredRecord::from_bytes(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_key(&self, key: u64) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<V> DurableStore<V> for JsonDirStore
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn put(&self, entry: Entry<V>) -> Result<(), StorageError> {
        let record = StoredRecord::new(&entry)?;
        let bytes = record.to_bytes()?;
        let target = self.path_for(record.key);
        let temp = target.with_extension("tmp");

        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(&bytes).await?;
        // Durable before the rename makes it visible
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp, &target).await?;
        Ok(())
    }

    async fn get(&self, key: u64) -> Result<Option<Entry<V>>, StorageError> {
        match self.read_record(key).await? {
            Some(record) => record.into_entry().map(Some).inspect_err(|e| {
                tracing::warn!(key, error = %e, "durable record failed verification");
            }),
            None => Ok(None),
        }
    }

    async fn get_all(&self) -> Result<Vec<Entry<V>>, StorageError> {
        let mut entries = Vec::new();
        for key in self.keys().await? {
            if let Some(entry) = DurableStore::<V>::get(self, key).await? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn remove(&self, keys: &[u64]) -> Result<(), StorageError> {
        for key in keys {
            self.remove_key(*key).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        for key in self.keys().await? {
            self.remove_key(key).await?;
        }
        Ok(())
    }

    async fn len(&self) -> Result<usize, StorageError> {
        Ok(self.keys().await?.len())
    }
}

#[cfg(test)]
#[path = "dir_tests.rs"]
mod tests;
