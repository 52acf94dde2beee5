// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::error::StorageError;
use crate::store::DurableStore;
use async_trait::async_trait;
use rewind_core::Entry;
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds tracing to any DurableStore
#[derive(Debug, Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[async_trait]
impl<V, S> DurableStore<V> for TracedStore<S>
where
    V: Send + Sync + 'static,
    S: DurableStore<V>,
{
    async fn put(&self, entry: Entry<V>) -> Result<(), StorageError> {
        let key = entry.key();
        let span = tracing::info_span!("store.put", key);
        async {
            let start = Instant::now();
            let result = self.inner.put(entry).await;
            match &result {
                Ok(()) => tracing::debug!(elapsed_ms = elapsed_ms(start), "stored"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed_ms(start),
                    error = %e,
                    "put failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn get(&self, key: u64) -> Result<Option<Entry<V>>, StorageError> {
        let span = tracing::info_span!("store.get", key);
        async {
            let start = Instant::now();
            let result = self.inner.get(key).await;
            match &result {
                Ok(found) => tracing::debug!(
                    found = found.is_some(),
                    elapsed_ms = elapsed_ms(start),
                    "read"
                ),
                Err(e) => tracing::error!(error = %e, "get failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn get_all(&self) -> Result<Vec<Entry<V>>, StorageError> {
        let span = tracing::info_span!("store.get_all");
        async {
            let start = Instant::now();
            let result = self.inner.get_all().await;
            match &result {
                Ok(entries) => tracing::info!(
                    count = entries.len(),
                    elapsed_ms = elapsed_ms(start),
                    "loaded"
                ),
                Err(e) => tracing::error!(error = %e, "get_all failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn remove(&self, keys: &[u64]) -> Result<(), StorageError> {
        let span = tracing::info_span!("store.remove", count = keys.len());
        async {
            let result = self.inner.remove(keys).await;
            match &result {
                Ok(()) => tracing::debug!("removed"),
                Err(e) => tracing::error!(error = %e, "remove failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let span = tracing::info_span!("store.clear");
        async {
            let result = self.inner.clear().await;
            match &result {
                Ok(()) => tracing::info!("cleared"),
                Err(e) => tracing::error!(error = %e, "clear failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn len(&self) -> Result<usize, StorageError> {
        self.inner.len().await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
