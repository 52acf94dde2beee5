// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-tier engine
//!
//! Owns an in-memory [`Timeline`] with an explicit redo stack. Every
//! operation runs to completion synchronously; subscribers hear about
//! changes on the next scheduler tick.

use crate::batch::Batch;
use crate::error::{BoxError, EngineError};
use crate::options::{ExecutorBuilder, HistoryValue, Profile};
use rewind_core::{
    check_unique_indices, snapshot, Admission, Entry, HistoryConfig, Notifier, Recorder,
    Subscriber, SubscriberId, Timeline,
};
use std::future::Future;
use std::sync::Arc;

/// History engine over a wrapped computation
pub struct Executor<A, V> {
    pub(crate) id: String,
    pub(crate) profile: Profile<A, V>,
    pub(crate) recorder: Recorder<V>,
    pub(crate) timeline: Timeline<V>,
    pub(crate) value: Option<V>,
    pub(crate) initial: Option<V>,
    pub(crate) notifier: Notifier,
    pub(crate) batch: Option<Batch>,
}

impl<A, V: HistoryValue> ExecutorBuilder<A, V> {
    /// Build a single-tier engine, running the eager call if configured
    pub fn build(self) -> Result<Executor<A, V>, EngineError> {
        let (profile, call_now) = self.into_profile();
        Executor::from_profile(profile, call_now)
    }
}

impl<A, V: HistoryValue> Executor<A, V> {
    pub fn builder<F>(callback: F) -> ExecutorBuilder<A, V>
    where
        F: Fn(A) -> Result<V, BoxError> + Send + Sync + 'static,
    {
        ExecutorBuilder::new(callback)
    }

    pub(crate) fn empty(profile: Profile<A, V>) -> Self {
        let id = profile.id_gen.next();
        Self {
            id,
            recorder: Recorder::new(profile.settings.clone()),
            timeline: Timeline::new(profile.config.max_history),
            value: None,
            initial: None,
            notifier: Notifier::new(Arc::clone(&profile.scheduler)),
            batch: None,
            profile,
        }
    }

    fn from_profile(profile: Profile<A, V>, call_now: Option<A>) -> Result<Self, EngineError> {
        let mut exec = Self::empty(profile);
        if let Some(value) = exec.profile.seed(&exec.id, call_now)? {
            exec.initial = Some(snapshot(&value));
            if exec.recorder.store_history() {
                let entry = exec.recorder.stamp(&value, exec.profile.clock.as_ref());
                exec.timeline.push(entry);
            }
            exec.value = Some(value);
        }
        tracing::info!(
            executor = %exec.id,
            seeded = exec.value.is_some(),
            bound = ?exec.timeline.bound(),
            "executor created"
        );
        Ok(exec)
    }

    /// Build an engine whose timeline is exactly `entries`
    ///
    /// Entries keep their insertion indices; entries without one are given
    /// fresh indices. The first entry becomes the initial value and the last
    /// the current value. Any eager call on the builder is ignored.
    pub fn from_entries(
        builder: ExecutorBuilder<A, V>,
        entries: Vec<Entry<V>>,
    ) -> Result<Self, EngineError> {
        check_unique_indices(entries.iter())?;
        let (profile, _) = builder.into_profile();
        let mut exec = Self::empty(profile);
        exec.adopt(entries);
        Ok(exec)
    }

    /// Construct a peer sharing this engine's callback and options
    pub(crate) fn peer(&self, entries: Vec<Entry<V>>) -> Self {
        let mut exec = Self::empty(self.profile.clone());
        exec.adopt(entries);
        exec
    }

    fn adopt(&mut self, mut entries: Vec<Entry<V>>) {
        self.number(&mut entries);
        self.initial = entries.first().map(|e| snapshot(&e.value));
        self.timeline.restore(entries, Vec::new());
        self.value = self.timeline.last().map(|e| snapshot(&e.value));
    }

    /// Keep the counter ahead of incoming indices; number entries without one
    pub(crate) fn number(&mut self, entries: &mut [Entry<V>]) {
        for index in entries.iter().filter_map(|e| e.index) {
            self.recorder.observe_index(index);
        }
        for entry in entries.iter_mut().filter(|e| e.index.is_none()) {
            self.recorder.renumber(entry, self.profile.clock.as_ref());
        }
    }

    // -- accessors ---------------------------------------------------------

    /// Instance id used in log fields
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.profile.config
    }

    /// Current value
    pub fn value(&self) -> Option<V> {
        self.value.clone()
    }

    pub fn initial_value(&self) -> Option<V> {
        self.initial.clone()
    }

    pub fn history_enabled(&self) -> bool {
        self.recorder.store_history()
    }

    pub fn get_history(&self) -> Vec<Entry<V>> {
        self.timeline.to_vec()
    }

    /// Redo buffer, bottom first; the next entry to redo is last
    pub fn redo_stack(&self) -> Vec<Entry<V>> {
        self.timeline.redo_stack().to_vec()
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.timeline.cursor()
    }

    /// Emit the timeline through `tracing`
    pub fn log(&self) {
        tracing::info!(
            executor = %self.id,
            len = self.timeline.len(),
            redo = self.timeline.redo_stack().len(),
            cursor = ?self.timeline.cursor(),
            "history"
        );
        for (position, entry) in self.timeline.entries().enumerate() {
            tracing::info!(
                executor = %self.id,
                position,
                index = ?entry.index,
                group = ?entry.group,
                value = %serde_json::to_string(&entry.value).unwrap_or_default(),
                "entry"
            );
        }
    }

    // -- computation -------------------------------------------------------

    /// Run the wrapped computation and record its result
    pub fn invoke(&mut self, args: A) -> Result<Option<V>, EngineError> {
        let result = (self.profile.callback)(args);
        self.settle(result)
    }

    /// Apply the outcome of a computation that completed elsewhere
    pub fn settle(&mut self, result: Result<V, BoxError>) -> Result<Option<V>, EngineError> {
        match result {
            Ok(value) => self.apply(value),
            Err(e) => {
                tracing::debug!(executor = %self.id, error = %e, "computation failed");
                self.profile.route(&self.id, EngineError::Compute(e))?;
            }
        }
        Ok(self.value())
    }

    /// Await an asynchronous computation, then settle it
    pub async fn invoke_async<F>(&mut self, computation: F) -> Result<Option<V>, EngineError>
    where
        F: Future<Output = Result<V, BoxError>>,
    {
        let result = computation.await;
        self.settle(result)
    }

    fn apply(&mut self, value: V) {
        if self.initial.is_none() {
            self.initial = Some(snapshot(&value));
        }
        if let Some(batch) = self.batch.as_mut() {
            batch.invocations += 1;
            self.value = Some(value);
            return;
        }
        self.record(&value);
        self.value = Some(value);
        self.changed();
    }

    fn record(&mut self, value: &V) -> Admission {
        let admission = self.recorder.admit(value, self.timeline.values());
        if admission.is_accepted() {
            let entry = self.recorder.stamp(value, self.profile.clock.as_ref());
            let index = entry.key();
            let evicted = self.timeline.push(entry);
            tracing::debug!(executor = %self.id, index, evicted, "recorded");
        } else {
            tracing::trace!(executor = %self.id, ?admission, "not recorded");
        }
        admission
    }

    /// Schedule a notification unless paused or inside a batch
    pub(crate) fn changed(&self) {
        if !self.recorder.is_paused() && self.batch.is_none() {
            self.notifier.notify();
        }
    }

    fn require_history(&self, operation: &'static str) -> Result<bool, EngineError> {
        if self.recorder.store_history() {
            return Ok(true);
        }
        self.profile.usage(&self.id, operation)?;
        Ok(false)
    }

    fn sync_to_cursor(&mut self) {
        if let Some(entry) = self.timeline.current() {
            self.value = Some(snapshot(&entry.value));
        }
    }

    pub(crate) fn sync_to_last(&mut self) {
        if let Some(entry) = self.timeline.last() {
            self.value = Some(snapshot(&entry.value));
        }
    }

    fn out_of_range(&self, operation: &'static str, index: usize) {
        tracing::warn!(
            executor = %self.id,
            operation,
            index,
            len = self.timeline.len(),
            "index out of range"
        );
    }

    // -- navigation --------------------------------------------------------

    /// Step back up to `steps` entries; never passes the first entry
    pub fn undo(&mut self, steps: usize) -> Option<V> {
        if !self.recorder.store_history() {
            return self.value();
        }
        let moved = self.timeline.undo(steps);
        if moved > 0 {
            self.sync_to_cursor();
            tracing::debug!(executor = %self.id, moved, "undo");
            self.changed();
        }
        self.value()
    }

    /// Re-apply up to `steps` undone entries
    pub fn redo(&mut self, steps: usize) -> Option<V> {
        if !self.recorder.store_history() {
            return self.value();
        }
        let moved = self.timeline.redo(steps);
        if moved > 0 {
            self.sync_to_cursor();
            tracing::debug!(executor = %self.id, moved, "redo");
            self.changed();
        }
        self.value()
    }

    /// Show the entry at `index` without restructuring history
    pub fn jump_to(&mut self, index: usize) -> Result<Option<V>, EngineError> {
        if !self.require_history("jump_to")? {
            return Ok(self.value());
        }
        if self.timeline.seek(index) {
            self.sync_to_cursor();
            self.changed();
        } else {
            self.out_of_range("jump_to", index);
        }
        Ok(self.value())
    }

    // -- direct edits ------------------------------------------------------

    /// Overwrite the value at `index`, regenerating its meta and group
    pub fn replace_at(&mut self, index: usize, value: V) -> Result<Option<V>, EngineError> {
        if !self.require_history("replace_at")? {
            return Ok(self.value());
        }
        let Some(existing) = self.timeline.get(index) else {
            self.out_of_range("replace_at", index);
            return Ok(self.value());
        };
        let mut entry = Entry {
            value: snapshot(&value),
            meta: None,
            group: None,
            index: existing.index,
            time: existing.time,
        };
        self.recorder.retag(&mut entry);
        self.timeline.replace(index, entry);
        if index + 1 == self.timeline.len() {
            self.value = Some(value);
        }
        self.changed();
        Ok(self.value())
    }

    /// Splice a new entry in at `index`; `index == len` appends
    pub fn insert_at(&mut self, index: usize, value: V) -> Result<Option<V>, EngineError> {
        if !self.require_history("insert_at")? {
            return Ok(self.value());
        }
        if index > self.timeline.len() {
            self.out_of_range("insert_at", index);
            return Ok(self.value());
        }
        let entry = self.recorder.stamp(&value, self.profile.clock.as_ref());
        self.timeline.insert(index, entry);
        self.value = Some(value);
        self.changed();
        Ok(self.value())
    }

    /// Delete the entry at `index`
    pub fn remove_at(&mut self, index: usize) -> Result<Option<V>, EngineError> {
        if !self.require_history("remove_at")? {
            return Ok(self.value());
        }
        if self.timeline.remove(index).is_none() {
            self.out_of_range("remove_at", index);
            return Ok(self.value());
        }
        self.value = match self.timeline.last() {
            Some(entry) => Some(snapshot(&entry.value)),
            None => self.initial.clone(),
        };
        self.changed();
        Ok(self.value())
    }

    // -- lifecycle ---------------------------------------------------------

    /// Return to the initial value with a single-entry history
    pub fn reset(&mut self) -> Option<V> {
        self.value = self.initial.clone();
        if self.recorder.store_history() {
            let seed = match &self.initial {
                Some(v) => Some(self.recorder.stamp(v, self.profile.clock.as_ref())),
                None => None,
            };
            self.timeline.reseed(seed);
        }
        tracing::info!(executor = %self.id, "reset");
        self.changed();
        self.value()
    }

    /// Drop all history except an entry for the current value
    pub fn clear_history(&mut self) -> Option<V> {
        if self.recorder.store_history() {
            let seed = match &self.value {
                Some(v) => Some(self.recorder.stamp(v, self.profile.clock.as_ref())),
                None => None,
            };
            self.timeline.reseed(seed);
            tracing::info!(executor = %self.id, "history cleared");
            self.changed();
        }
        self.value()
    }

    /// Stop recording and notifying until [`resume_history`](Self::resume_history)
    pub fn pause_history(&mut self) {
        self.recorder.set_paused(true);
        tracing::debug!(executor = %self.id, "paused");
    }

    pub fn resume_history(&mut self) {
        self.recorder.set_paused(false);
        tracing::debug!(executor = %self.id, "resumed");
        self.changed();
    }

    pub fn is_paused(&self) -> bool {
        self.recorder.is_paused()
    }

    /// Run `f` with recording and notification suspended, then record the
    /// final value once and notify once
    ///
    /// With history disabled, or inside another batch, `f` simply runs.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        if !self.recorder.store_history() || self.batch.is_some() {
            return f(self);
        }
        self.batch = Some(Batch::default());
        let result = f(self);
        let batch = self.batch.take().unwrap_or_default();
        tracing::debug!(executor = %self.id, invocations = batch.invocations, "batch closed");
        if let Some(value) = self.value.clone() {
            self.record(&value);
        }
        self.changed();
        result
    }

    // -- subscriptions -----------------------------------------------------

    pub fn subscribe(&self, callback: Subscriber) -> SubscriberId {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Deliver a pending change notification now
    ///
    /// Without a tokio runtime the default scheduler has no later turn, so a
    /// synchronous caller delivers coalesced notifications this way.
    pub fn flush_notifications(&self) -> bool {
        self.notifier.flush()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

impl<A, V> std::fmt::Debug for Executor<A, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("id", &self.id)
            .field("len", &self.timeline.len())
            .field("redo", &self.timeline.redo_stack().len())
            .field("recorder", &self.recorder)
            .finish()
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
