// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared access to a two-tier engine
//!
//! Callers on different tasks queue on a fair `tokio::sync::Mutex`, so each
//! operation starts from the state the previous one committed, even across
//! durable-store awaits.

use crate::error::EngineError;
use crate::options::HistoryValue;
use crate::tiered::TieredExecutor;
use rewind_core::{Entry, Subscriber, SubscriberId};
use rewind_storage::DurableStore;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Cloneable handle serializing access to one [`TieredExecutor`]
pub struct TieredHandle<A, V, S> {
    inner: Arc<Mutex<TieredExecutor<A, V, S>>>,
}

impl<A, V, S> Clone for TieredHandle<A, V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, V, S> TieredHandle<A, V, S>
where
    V: HistoryValue,
    S: DurableStore<V>,
{
    pub fn new(executor: TieredExecutor<A, V, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(executor)),
        }
    }

    /// Wait for exclusive access for a sequence of operations
    pub async fn lock(&self) -> MutexGuard<'_, TieredExecutor<A, V, S>> {
        self.inner.lock().await
    }

    pub async fn invoke(&self, args: A) -> Result<Option<V>, EngineError> {
        self.inner.lock().await.invoke(args).await
    }

    pub async fn value(&self) -> Option<V> {
        self.inner.lock().await.value()
    }

    pub async fn undo(&self, steps: usize) -> Result<Option<V>, EngineError> {
        self.inner.lock().await.undo(steps).await
    }

    pub async fn redo(&self, steps: usize) -> Result<Option<V>, EngineError> {
        self.inner.lock().await.redo(steps).await
    }

    pub async fn jump_to(&self, index: usize) -> Result<Option<V>, EngineError> {
        self.inner.lock().await.jump_to(index).await
    }

    pub async fn replace_at(&self, index: usize, value: V) -> Result<Option<V>, EngineError> {
        self.inner.lock().await.replace_at(index, value).await
    }

    pub async fn remove_at(&self, index: usize) -> Result<Option<V>, EngineError> {
        self.inner.lock().await.remove_at(index).await
    }

    pub async fn reset(&self) -> Result<Option<V>, EngineError> {
        self.inner.lock().await.reset().await
    }

    pub async fn clear_history(&self) -> Result<Option<V>, EngineError> {
        self.inner.lock().await.clear_history().await
    }

    pub async fn get_history(&self) -> Result<Vec<Entry<V>>, EngineError> {
        self.inner.lock().await.get_history().await
    }

    pub async fn export_history(&self) -> Result<String, EngineError> {
        self.inner.lock().await.export_history().await
    }

    pub async fn import_history(&self, json: &str) -> Result<Option<V>, EngineError> {
        self.inner.lock().await.import_history(json).await
    }

    pub async fn subscribe(&self, callback: Subscriber) -> SubscriberId {
        self.inner.lock().await.subscribe(callback)
    }

    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.inner.lock().await.unsubscribe(id)
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
