// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Joint control over several independent engines
//!
//! Members may wrap different value types, so results come back as JSON
//! values, one per member in member order. A failing member does not stop
//! the fan-out.

use crate::error::EngineError;
use crate::executor::Executor;
use crate::handle::TieredHandle;
use crate::options::HistoryValue;
use crate::tiered::TieredExecutor;
use async_trait::async_trait;
use rewind_storage::DurableStore;
use serde::Serialize;
use serde_json::Value;

fn to_json<V: Serialize>(value: Option<V>) -> Result<Value, EngineError> {
    Ok(serde_json::to_value(value)?)
}

/// Operations an engine exposes to an [`ExecutorGroup`]
#[async_trait]
pub trait GroupMember: Send {
    async fn undo(&mut self) -> Result<Value, EngineError>;
    async fn redo(&mut self) -> Result<Value, EngineError>;
    async fn reset(&mut self) -> Result<Value, EngineError>;
    async fn clear_history(&mut self) -> Result<Value, EngineError>;
    async fn export(&mut self) -> Result<String, EngineError>;
    async fn import(&mut self, json: &str) -> Result<Value, EngineError>;
    async fn value(&mut self) -> Result<Value, EngineError>;
}

#[async_trait]
impl<A, V> GroupMember for Executor<A, V>
where
    A: 'static,
    V: HistoryValue,
{
    async fn undo(&mut self) -> Result<Value, EngineError> {
        to_json(Executor::undo(self, 1))
    }

    async fn redo(&mut self) -> Result<Value, EngineError> {
        to_json(Executor::redo(self, 1))
    }

    async fn reset(&mut self) -> Result<Value, EngineError> {
        to_json(Executor::reset(self))
    }

    async fn clear_history(&mut self) -> Result<Value, EngineError> {
        to_json(Executor::clear_history(self))
    }

    async fn export(&mut self) -> Result<String, EngineError> {
        self.export_history()
    }

    async fn import(&mut self, json: &str) -> Result<Value, EngineError> {
        to_json(self.import_history(json)?)
    }

    async fn value(&mut self) -> Result<Value, EngineError> {
        to_json(Executor::value(self))
    }
}

#[async_trait]
impl<A, V, S> GroupMember for TieredExecutor<A, V, S>
where
    A: 'static,
    V: HistoryValue,
    S: DurableStore<V> + 'static,
{
    async fn undo(&mut self) -> Result<Value, EngineError> {
        to_json(TieredExecutor::undo(self, 1).await?)
    }

    async fn redo(&mut self) -> Result<Value, EngineError> {
        to_json(TieredExecutor::redo(self, 1).await?)
    }

    async fn reset(&mut self) -> Result<Value, EngineError> {
        to_json(TieredExecutor::reset(self).await?)
    }

    async fn clear_history(&mut self) -> Result<Value, EngineError> {
        to_json(TieredExecutor::clear_history(self).await?)
    }

    async fn export(&mut self) -> Result<String, EngineError> {
        self.export_history().await
    }

    async fn import(&mut self, json: &str) -> Result<Value, EngineError> {
        to_json(self.import_history(json).await?)
    }

    async fn value(&mut self) -> Result<Value, EngineError> {
        to_json(TieredExecutor::value(self))
    }
}

#[async_trait]
impl<A, V, S> GroupMember for TieredHandle<A, V, S>
where
    A: Send + 'static,
    V: HistoryValue,
    S: DurableStore<V> + 'static,
{
    async fn undo(&mut self) -> Result<Value, EngineError> {
        to_json(TieredHandle::undo(self, 1).await?)
    }

    async fn redo(&mut self) -> Result<Value, EngineError> {
        to_json(TieredHandle::redo(self, 1).await?)
    }

    async fn reset(&mut self) -> Result<Value, EngineError> {
        to_json(TieredHandle::reset(self).await?)
    }

    async fn clear_history(&mut self) -> Result<Value, EngineError> {
        to_json(TieredHandle::clear_history(self).await?)
    }

    async fn export(&mut self) -> Result<String, EngineError> {
        self.export_history().await
    }

    async fn import(&mut self, json: &str) -> Result<Value, EngineError> {
        to_json(self.import_history(json).await?)
    }

    async fn value(&mut self) -> Result<Value, EngineError> {
        to_json(TieredHandle::value(self).await)
    }
}

/// Fan-out of undo/redo/reset/clear/export/import across members
#[derive(Default)]
pub struct ExecutorGroup<'a> {
    members: Vec<&'a mut dyn GroupMember>,
}

impl<'a> ExecutorGroup<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, member: &'a mut dyn GroupMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn push(&mut self, member: &'a mut dyn GroupMember) {
        self.members.push(member);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub async fn undo(&mut self) -> Vec<Result<Value, EngineError>> {
        let mut results = Vec::with_capacity(self.members.len());
        for member in self.members.iter_mut() {
            results.push(member.undo().await);
        }
        results
    }

    pub async fn redo(&mut self) -> Vec<Result<Value, EngineError>> {
        let mut results = Vec::with_capacity(self.members.len());
        for member in self.members.iter_mut() {
            results.push(member.redo().await);
        }
        results
    }

    pub async fn reset(&mut self) -> Vec<Result<Value, EngineError>> {
        let mut results = Vec::with_capacity(self.members.len());
        for member in self.members.iter_mut() {
            results.push(member.reset().await);
        }
        results
    }

    pub async fn clear_history(&mut self) -> Vec<Result<Value, EngineError>> {
        let mut results = Vec::with_capacity(self.members.len());
        for member in self.members.iter_mut() {
            results.push(member.clear_history().await);
        }
        results
    }

    /// Full-state export of every member
    pub async fn export(&mut self) -> Vec<Result<String, EngineError>> {
        let mut results = Vec::with_capacity(self.members.len());
        for member in self.members.iter_mut() {
            results.push(member.export().await);
        }
        results
    }

    /// Import payloads by position
    ///
    /// A missing payload (`None`, or past the end of `payloads`) leaves its
    /// member untouched and yields `Ok(None)`.
    pub async fn import_all(
        &mut self,
        payloads: &[Option<String>],
    ) -> Vec<Result<Option<Value>, EngineError>> {
        let mut results = Vec::with_capacity(self.members.len());
        for (i, member) in self.members.iter_mut().enumerate() {
            let result = match payloads.get(i).and_then(|p| p.as_deref()) {
                Some(json) => member.import(json).await.map(Some),
                None => {
                    tracing::debug!(member = i, "no payload; member untouched");
                    Ok(None)
                }
            };
            results.push(result);
        }
        results
    }

    /// Current value of every member
    pub async fn values(&mut self) -> Vec<Result<Value, EngineError>> {
        let mut results = Vec::with_capacity(self.members.len());
        for member in self.members.iter_mut() {
            results.push(member.value().await);
        }
        results
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
