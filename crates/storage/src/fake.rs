// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake durable store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::error::StorageError;
use crate::memory::MemoryStore;
use crate::store::DurableStore;
use async_trait::async_trait;
use rewind_core::Entry;
use std::sync::{Arc, Mutex};

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Put(u64),
    Get(u64),
    GetAll,
    Remove(Vec<u64>),
    Clear,
    Len,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<StoreCall>,
    fail_next: Option<(usize, String)>,
}

/// In-memory store that records calls and can inject failures
pub struct FakeStore<V> {
    inner: MemoryStore<V>,
    state: Arc<Mutex<FakeState>>,
}

impl<V> Clone for FakeStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<V> Default for FakeStore<V> {
    fn default() -> Self {
        Self {
            inner: MemoryStore::new(),
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }
}

impl<V> FakeStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Count recorded `get` calls
    pub fn get_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Get(_)))
            .count()
    }

    pub fn clear_calls(&self) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clear();
    }

    /// Make the next call fail with an injected error
    pub fn fail_next(&self, message: &str) {
        self.fail_after(0, message);
    }

    /// Let `calls` more calls succeed, then fail the one after
    pub fn fail_after(&self, calls: usize, message: &str) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).fail_next =
            Some((calls, message.to_string()));
    }

    fn record(&self, call: StoreCall) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(call);
        match state.fail_next.take() {
            Some((0, message)) => Err(StorageError::Injected(message)),
            Some((remaining, message)) => {
                state.fail_next = Some((remaining - 1, message));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<V> DurableStore<V> for FakeStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn put(&self, entry: Entry<V>) -> Result<(), StorageError> {
        self.record(StoreCall::Put(entry.key()))?;
        self.inner.put(entry).await
    }

    async fn get(&self, key: u64) -> Result<Option<Entry<V>>, StorageError> {
        self.record(StoreCall::Get(key))?;
        self.inner.get(key).await
    }

    async fn get_all(&self) -> Result<Vec<Entry<V>>, StorageError> {
        self.record(StoreCall::GetAll)?;
        self.inner.get_all().await
    }

    async fn remove(&self, keys: &[u64]) -> Result<(), StorageError> {
        self.record(StoreCall::Remove(keys.to_vec()))?;
        self.inner.remove(keys).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.record(StoreCall::Clear)?;
        self.inner.clear().await
    }

    async fn len(&self) -> Result<usize, StorageError> {
        self.record(StoreCall::Len)?;
        self.inner.len().await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
