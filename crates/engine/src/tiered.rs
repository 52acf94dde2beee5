// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two-tier engine
//!
//! Recent entries live in a bounded [`FastWindow`]; every entry is written
//! through to a [`DurableStore`] keyed by insertion index. The timeline is
//! an ordered key list split at `head`:
//!
//! ```text
//! keys:  [k0, k1, k2 | k3, k4]
//!                    ^ head = 3
//! history = k0..k2, redo buffer = k3 (top), k4
//! ```
//!
//! Undo and redo move `head`; recording a new value first deletes the keys
//! past `head` from both tiers. Reads try the window, then the store.

use crate::batch::{Batch, BatchScope};
use crate::error::{BoxError, EngineError};
use crate::executor::Executor;
use crate::options::{ExecutorBuilder, HistoryValue, Profile};
use rewind_core::{
    check_unique_indices, filter_entries, parse_entries, serialize_entries, snapshot, Admission,
    Entry, HistoryConfig, HistoryQuery, Notifier, Recorder, StatePayload,
    Subscriber, SubscriberId,
};
use rewind_storage::{DurableStore, FastWindow, StorageError};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

impl<A, V: HistoryValue> ExecutorBuilder<A, V> {
    /// Build a two-tier engine over `store`
    ///
    /// Entries already in the store become the history, in insertion
    /// order. The eager call, if configured, seeds an empty store and
    /// otherwise only supplies the initial value.
    pub async fn build_tiered<S>(self, store: S) -> Result<TieredExecutor<A, V, S>, EngineError>
    where
        S: DurableStore<V>,
    {
        let (profile, call_now) = self.into_profile();
        TieredExecutor::open(profile, call_now, store).await
    }
}

/// History engine with a fast window in front of a durable store
pub struct TieredExecutor<A, V, S> {
    id: String,
    profile: Profile<A, V>,
    recorder: Recorder<V>,
    window: FastWindow<V>,
    store: S,
    keys: Vec<u64>,
    head: usize,
    cursor: Option<usize>,
    value: Option<V>,
    initial: Option<V>,
    notifier: Notifier,
}

impl<A, V, S> TieredExecutor<A, V, S>
where
    V: HistoryValue,
    S: DurableStore<V>,
{
    async fn open(
        profile: Profile<A, V>,
        call_now: Option<A>,
        store: S,
    ) -> Result<Self, EngineError> {
        let mut exec = Self {
            id: profile.id_gen.next(),
            recorder: Recorder::new(profile.settings.clone()),
            window: FastWindow::new(profile.config.window),
            store,
            keys: Vec::new(),
            head: 0,
            cursor: None,
            value: None,
            initial: None,
            notifier: Notifier::new(Arc::clone(&profile.scheduler)),
            profile,
        };

        let existing = exec.store.get_all().await?;
        let seed = exec.profile.seed(&exec.id, call_now)?;

        if !existing.is_empty() {
            for entry in &existing {
                exec.recorder.observe_index(entry.key());
            }
            exec.keys = existing.iter().map(Entry::key).collect();
            exec.head = exec.keys.len();
            exec.initial = match seed {
                Some(value) => Some(value),
                None => existing.first().map(|e| snapshot(&e.value)),
            };
            exec.value = existing.last().map(|e| snapshot(&e.value));
            exec.window.refill(existing);
            tracing::info!(executor = %exec.id, len = exec.head, "restored from durable store");
        } else if let Some(value) = seed {
            exec.initial = Some(snapshot(&value));
            if exec.recorder.store_history() {
                let entry = exec.recorder.stamp(&value, exec.profile.clock.as_ref());
                exec.append(entry).await?;
            }
            exec.value = Some(value);
        }
        exec.cursor_to_head();

        tracing::info!(
            executor = %exec.id,
            window = exec.window.capacity(),
            seeded = exec.value.is_some(),
            "tiered executor created"
        );
        Ok(exec)
    }

    // -- accessors ---------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.profile.config
    }

    pub fn value(&self) -> Option<V> {
        self.value.clone()
    }

    pub fn initial_value(&self) -> Option<V> {
        self.initial.clone()
    }

    pub fn history_enabled(&self) -> bool {
        self.recorder.store_history()
    }

    /// Number of history entries (excluding the redo buffer)
    pub fn len(&self) -> usize {
        self.head
    }

    pub fn is_empty(&self) -> bool {
        self.head == 0
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn window(&self) -> &FastWindow<V> {
        &self.window
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Full history from the durable store
    pub async fn get_history(&self) -> Result<Vec<Entry<V>>, EngineError> {
        self.load(&self.keys[..self.head]).await
    }

    /// Redo buffer, bottom first; the next entry to redo is last
    pub async fn redo_stack(&self) -> Result<Vec<Entry<V>>, EngineError> {
        let mut entries = self.load(&self.keys[self.head..]).await?;
        entries.reverse();
        Ok(entries)
    }

    pub async fn filter_history<P>(&self, predicate: P) -> Result<Vec<Entry<V>>, EngineError>
    where
        P: Fn(&Entry<V>) -> bool,
    {
        let entries = self.get_history().await?;
        Ok(filter_entries(entries.iter(), predicate))
    }

    pub async fn query_history(&self, query: &HistoryQuery) -> Result<Vec<Entry<V>>, EngineError> {
        self.filter_history(|e| query.matches(e)).await
    }

    /// Emit the timeline through `tracing`
    pub async fn log(&self) -> Result<(), EngineError> {
        let entries = self.get_history().await?;
        tracing::info!(
            executor = %self.id,
            len = self.head,
            redo = self.keys.len() - self.head,
            window = self.window.len(),
            "history"
        );
        for (position, entry) in entries.iter().enumerate() {
            tracing::info!(
                executor = %self.id,
                position,
                index = ?entry.index,
                cached = self.window.contains(entry.key()),
                value = %serde_json::to_string(&entry.value).unwrap_or_default(),
                "entry"
            );
        }
        Ok(())
    }

    /// Move the history into a single-tier engine with the same options
    pub async fn to_single_tier(&self) -> Result<Executor<A, V>, EngineError> {
        let payload = self.export_state().await?;
        let mut exec = Executor::empty(self.profile.clone());
        exec.apply_state(payload);
        Ok(exec)
    }

    // -- tier plumbing -----------------------------------------------------

    /// Resolve one entry, preferring the window
    async fn resolve(&self, key: u64) -> Result<Entry<V>, EngineError> {
        if let Some(entry) = self.window.get(key) {
            return Ok(entry.clone());
        }
        tracing::debug!(executor = %self.id, key, "window miss");
        match self.store.get(key).await? {
            Some(entry) => Ok(entry),
            None => Err(StorageError::Missing { key }.into()),
        }
    }

    /// Resolve many entries from the durable store, in the order given
    async fn load(&self, keys: &[u64]) -> Result<Vec<Entry<V>>, EngineError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut all: HashMap<u64, Entry<V>> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .map(|e| (e.key(), e))
            .collect();
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            match all.remove(key) {
                Some(entry) => entries.push(entry),
                None => return Err(StorageError::Missing { key: *key }.into()),
            }
        }
        Ok(entries)
    }

    /// Write through to both tiers and append to the key list
    async fn append(&mut self, entry: Entry<V>) -> Result<(), EngineError> {
        let key = entry.key();
        self.store.put(entry.clone()).await?;
        if let Some(evicted) = self.window.push(entry) {
            tracing::trace!(executor = %self.id, key = evicted.key(), "evicted from window");
        }
        self.keys.push(key);
        self.head = self.keys.len();
        Ok(())
    }

    /// Delete the redo buffer from both tiers
    async fn drop_redo(&mut self) -> Result<(), EngineError> {
        if self.head >= self.keys.len() {
            return Ok(());
        }
        let stale = self.keys[self.head..].to_vec();
        self.store.remove(&stale).await?;
        self.window.remove(&stale);
        self.keys.truncate(self.head);
        tracing::debug!(executor = %self.id, dropped = stale.len(), "redo buffer cleared");
        Ok(())
    }

    async fn wipe(&mut self) -> Result<(), EngineError> {
        self.store.clear().await?;
        self.window.clear();
        self.keys.clear();
        self.head = 0;
        self.cursor = None;
        Ok(())
    }

    /// Entries the recorder needs to judge a candidate
    async fn existing_values(&self) -> Result<Vec<V>, EngineError> {
        if self.recorder.needs_full_scan() {
            let entries = self.get_history().await?;
            return Ok(entries.into_iter().map(|e| e.value).collect());
        }
        if !self.recorder.equality().is_custom() {
            return Ok(Vec::new());
        }
        match self.head.checked_sub(1).and_then(|p| self.keys.get(p)) {
            Some(key) => Ok(vec![self.resolve(*key).await?.value]),
            None => Ok(Vec::new()),
        }
    }

    async fn show(&mut self, position: usize) -> Result<(), EngineError> {
        let Some(key) = self.keys.get(position).copied() else {
            return Ok(());
        };
        let entry = self.resolve(key).await?;
        self.value = Some(entry.value);
        Ok(())
    }

    fn cursor_to_head(&mut self) {
        self.cursor = self.head.checked_sub(1);
    }

    fn changed(&self) {
        if !self.recorder.is_paused() {
            self.notifier.notify();
        }
    }

    /// Route a failure to the hook, then report the current value
    fn conclude(&self, result: Result<(), EngineError>) -> Result<Option<V>, EngineError> {
        if let Err(e) = result {
            self.profile.route(&self.id, e)?;
        }
        Ok(self.value())
    }

    fn require_history(&self, operation: &'static str) -> Result<bool, EngineError> {
        if self.recorder.store_history() {
            return Ok(true);
        }
        self.profile.usage(&self.id, operation)?;
        Ok(false)
    }

    fn out_of_range(&self, operation: &'static str, index: usize) {
        tracing::warn!(
            executor = %self.id,
            operation,
            index,
            len = self.head,
            "index out of range"
        );
    }

    // -- computation -------------------------------------------------------

    pub async fn invoke(&mut self, args: A) -> Result<Option<V>, EngineError> {
        let result = (self.profile.callback)(args);
        self.settle(result).await
    }

    pub async fn invoke_async<F>(&mut self, computation: F) -> Result<Option<V>, EngineError>
    where
        F: Future<Output = Result<V, BoxError>>,
    {
        let result = computation.await;
        self.settle(result).await
    }

    /// Apply a computation outcome; accepted values are persisted before
    /// this returns
    pub async fn settle(&mut self, result: Result<V, BoxError>) -> Result<Option<V>, EngineError> {
        let value = match result {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(executor = %self.id, error = %e, "computation failed");
                return self.conclude(Err(EngineError::Compute(e)));
            }
        };
        if self.initial.is_none() {
            self.initial = Some(snapshot(&value));
        }
        let recorded = self.record(&value).await;
        self.value = Some(value);
        self.changed();
        self.conclude(recorded.map(|_| ()))
    }

    async fn record(&mut self, value: &V) -> Result<Admission, EngineError> {
        if let Some(blocked) = self.recorder.gate() {
            return Ok(blocked);
        }
        let existing = self.existing_values().await?;
        let admission = self.recorder.admit(value, existing.iter());
        if !admission.is_accepted() {
            tracing::trace!(executor = %self.id, ?admission, "not recorded");
            return Ok(admission);
        }
        self.drop_redo().await?;
        let entry = self.recorder.stamp(value, self.profile.clock.as_ref());
        let index = entry.key();
        self.append(entry).await?;
        self.cursor_to_head();
        tracing::debug!(executor = %self.id, index, "recorded");
        Ok(admission)
    }

    /// Run `f` against a compute-only scope, then record and notify once
    pub async fn batch<R, F>(&mut self, f: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut BatchScope<'_, A, V>) -> R,
    {
        let (result, batch) = {
            let mut scope = BatchScope {
                id: &self.id,
                profile: &self.profile,
                value: &mut self.value,
                initial: &mut self.initial,
                batch: Batch::default(),
            };
            let result = f(&mut scope);
            (result, scope.batch)
        };
        tracing::debug!(executor = %self.id, invocations = batch.invocations, "batch closed");
        if self.recorder.store_history() {
            if let Some(value) = self.value.clone() {
                let recorded = self.record(&value).await;
                self.conclude(recorded.map(|_| ()))?;
            }
        }
        self.changed();
        Ok(result)
    }

    // -- navigation --------------------------------------------------------

    pub async fn undo(&mut self, steps: usize) -> Result<Option<V>, EngineError> {
        if !self.recorder.store_history() {
            return Ok(self.value());
        }
        let moved = self.head.saturating_sub(1).min(steps);
        if moved == 0 {
            return Ok(self.value());
        }
        let shown = self.show(self.head - moved - 1).await;
        if shown.is_ok() {
            self.head -= moved;
            self.cursor_to_head();
            tracing::debug!(executor = %self.id, moved, "undo");
            self.changed();
        }
        self.conclude(shown)
    }

    pub async fn redo(&mut self, steps: usize) -> Result<Option<V>, EngineError> {
        if !self.recorder.store_history() {
            return Ok(self.value());
        }
        let moved = (self.keys.len() - self.head).min(steps);
        if moved == 0 {
            return Ok(self.value());
        }
        let shown = self.show(self.head + moved - 1).await;
        if shown.is_ok() {
            self.head += moved;
            self.cursor_to_head();
            tracing::debug!(executor = %self.id, moved, "redo");
            self.changed();
        }
        self.conclude(shown)
    }

    /// Show the entry at `index`, reading through to the durable store when
    /// the window no longer holds it
    pub async fn jump_to(&mut self, index: usize) -> Result<Option<V>, EngineError> {
        if !self.require_history("jump_to")? {
            return Ok(self.value());
        }
        if index >= self.head {
            self.out_of_range("jump_to", index);
            return Ok(self.value());
        }
        let shown = self.show(index).await;
        if shown.is_ok() {
            self.cursor = Some(index);
            self.changed();
        }
        self.conclude(shown)
    }

    // -- direct edits ------------------------------------------------------

    pub async fn replace_at(&mut self, index: usize, value: V) -> Result<Option<V>, EngineError> {
        if !self.require_history("replace_at")? {
            return Ok(self.value());
        }
        let Some(key) = self.keys[..self.head].get(index).copied() else {
            self.out_of_range("replace_at", index);
            return Ok(self.value());
        };
        let result = self.replace_key(key, &value).await;
        if result.is_ok() {
            if index + 1 == self.head {
                self.value = Some(value);
            }
            self.changed();
        }
        self.conclude(result)
    }

    async fn replace_key(&mut self, key: u64, value: &V) -> Result<(), EngineError> {
        let existing = self.resolve(key).await?;
        let mut entry = Entry {
            value: snapshot(value),
            meta: None,
            group: None,
            index: existing.index,
            time: existing.time,
        };
        self.recorder.retag(&mut entry);
        self.store.put(entry.clone()).await?;
        self.window.replace(entry);
        Ok(())
    }

    pub async fn remove_at(&mut self, index: usize) -> Result<Option<V>, EngineError> {
        if !self.require_history("remove_at")? {
            return Ok(self.value());
        }
        let Some(key) = self.keys[..self.head].get(index).copied() else {
            self.out_of_range("remove_at", index);
            return Ok(self.value());
        };
        if let Err(e) = self.store.remove(&[key]).await {
            return self.conclude(Err(e.into()));
        }
        self.window.remove(&[key]);
        self.keys.remove(index);
        self.head -= 1;
        self.cursor_to_head();
        let shown = match self.head.checked_sub(1) {
            Some(last) => self.show(last).await,
            None => {
                self.value = self.initial.clone();
                Ok(())
            }
        };
        self.changed();
        self.conclude(shown)
    }

    // -- lifecycle ---------------------------------------------------------

    /// Clear both tiers and reseed with the initial value
    pub async fn reset(&mut self) -> Result<Option<V>, EngineError> {
        let result = self.reseed(self.initial.clone()).await;
        self.value = self.initial.clone();
        tracing::info!(executor = %self.id, "reset");
        self.changed();
        self.conclude(result)
    }

    /// Clear both tiers and reseed with the current value
    pub async fn clear_history(&mut self) -> Result<Option<V>, EngineError> {
        if !self.recorder.store_history() {
            return Ok(self.value());
        }
        let result = self.reseed(self.value.clone()).await;
        tracing::info!(executor = %self.id, "history cleared");
        self.changed();
        self.conclude(result)
    }

    async fn reseed(&mut self, seed: Option<V>) -> Result<(), EngineError> {
        if !self.recorder.store_history() {
            return Ok(());
        }
        self.wipe().await?;
        if let Some(value) = seed {
            let entry = self.recorder.stamp(&value, self.profile.clock.as_ref());
            self.append(entry).await?;
        }
        self.cursor_to_head();
        Ok(())
    }

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

    // -- serialization -----------------------------------------------------

    pub async fn serialize_history(&self) -> Result<String, EngineError> {
        Ok(serialize_entries(&self.get_history().await?)?)
    }

    /// Replace history from a JSON entry array; the redo buffer is cleared
    pub async fn deserialize_history(&mut self, json: &str) -> Result<Option<V>, EngineError> {
        if !self.recorder.store_history() {
            return Ok(self.value());
        }
        let entries = match parse_entries::<V>(json) {
            Ok(entries) => entries,
            Err(e) => return self.conclude(Err(e.into())),
        };
        let mut result = self.replace_all(entries, Vec::new()).await;
        if result.is_ok() {
            if let Some(last) = self.head.checked_sub(1) {
                result = self.show(last).await;
            }
        }
        tracing::info!(executor = %self.id, len = self.head, "history deserialized");
        self.changed();
        self.conclude(result)
    }

    pub async fn export_state(&self) -> Result<StatePayload<V>, EngineError> {
        Ok(StatePayload {
            value: self.value(),
            initial_value: self.initial_value(),
            history: self.get_history().await?,
            redo_stack: self.redo_stack().await?,
        })
    }

    pub async fn export_history(&self) -> Result<String, EngineError> {
        Ok(self.export_state().await?.to_json()?)
    }

    pub async fn import_history(&mut self, json: &str) -> Result<Option<V>, EngineError> {
        match StatePayload::<V>::from_json(json) {
            Ok(payload) => self.import_state(payload).await,
            Err(e) => self.conclude(Err(e.into())),
        }
    }

    /// Replace value, initial value, history and redo buffer in both tiers
    pub async fn import_state(&mut self, payload: StatePayload<V>) -> Result<Option<V>, EngineError> {
        let StatePayload {
            value,
            initial_value,
            history,
            redo_stack,
        } = payload;
        let check = check_unique_indices(history.iter().chain(redo_stack.iter()));
        if let Err(e) = check {
            return self.conclude(Err(EngineError::Payload(e)));
        }
        let result = if self.recorder.store_history() {
            self.replace_all(history, redo_stack).await
        } else {
            Ok(())
        };
        if result.is_ok() {
            self.value = value;
            self.initial = initial_value;
        }
        tracing::info!(
            executor = %self.id,
            len = self.head,
            redo = self.keys.len() - self.head,
            "state imported"
        );
        self.changed();
        self.conclude(result)
    }

    /// Swap both tiers for the given history and redo buffer
    ///
    /// New entries are written before stale keys are dropped. A failed write
    /// is rolled back and leaves both tiers as they were.
    async fn replace_all(
        &mut self,
        mut history: Vec<Entry<V>>,
        mut redo: Vec<Entry<V>>,
    ) -> Result<(), EngineError> {
        for index in history.iter().chain(redo.iter()).filter_map(|e| e.index) {
            self.recorder.observe_index(index);
        }
        for entry in history.iter_mut().chain(redo.iter_mut()) {
            if entry.index.is_none() {
                self.recorder.renumber(entry, self.profile.clock.as_ref());
            }
        }

        let history_keys: Vec<u64> = history.iter().map(Entry::key).collect();
        let redo_keys: Vec<u64> = redo.iter().rev().map(Entry::key).collect();
        let incoming: BTreeSet<u64> = history_keys
            .iter()
            .chain(redo_keys.iter())
            .copied()
            .collect();

        let mut displaced = Vec::new();
        for key in self.keys.iter().filter(|k| incoming.contains(*k)) {
            displaced.push(self.resolve(*key).await?);
        }

        let written = match self.store.put_all(history.clone()).await {
            Ok(()) => self.store.put_all(redo).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            self.roll_back(&incoming, displaced).await;
            return Err(e.into());
        }

        let stale: Vec<u64> = self
            .keys
            .iter()
            .filter(|k| !incoming.contains(*k))
            .copied()
            .collect();
        if !stale.is_empty() {
            if let Err(e) = self.store.remove(&stale).await {
                tracing::warn!(
                    executor = %self.id,
                    error = %e,
                    stale = stale.len(),
                    "stale entries left in durable store"
                );
            }
        }

        self.window.refill(history);
        self.keys = history_keys;
        self.head = self.keys.len();
        self.keys.extend(redo_keys);
        self.cursor_to_head();
        Ok(())
    }

    /// Undo a partial write: drop keys that were new, restore overwritten ones
    async fn roll_back(&self, incoming: &BTreeSet<u64>, displaced: Vec<Entry<V>>) {
        let known: BTreeSet<u64> = self.keys.iter().copied().collect();
        let added: Vec<u64> = incoming.difference(&known).copied().collect();
        if !added.is_empty() {
            if let Err(e) = self.store.remove(&added).await {
                tracing::error!(
                    executor = %self.id,
                    error = %e,
                    "rollback could not drop new entries"
                );
            }
        }
        if !displaced.is_empty() {
            if let Err(e) = self.store.put_all(displaced).await {
                tracing::error!(executor = %self.id, error = %e, "rollback could not restore entries");
            }
        }
        tracing::warn!(executor = %self.id, "import rolled back");
    }

    pub async fn save_state(&self, path: &Path) -> Result<(), EngineError> {
        let json = self.export_history().await?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| EngineError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        tracing::info!(executor = %self.id, path = %path.display(), "state saved");
        Ok(())
    }

    pub async fn load_state(&mut self, path: &Path) -> Result<Option<V>, EngineError> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => self.import_history(&json).await,
            Err(e) => self.conclude(Err(EngineError::Io {
                path: path.display().to_string(),
                source: e,
            })),
        }
    }
}

impl<A, V, S> std::fmt::Debug for TieredExecutor<A, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredExecutor")
            .field("id", &self.id)
            .field("len", &self.head)
            .field("redo", &(self.keys.len() - self.head))
            .field("window", &self.window.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "tiered_tests.rs"]
mod tests;
