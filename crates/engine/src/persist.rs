// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serialization for the single-tier engine
//!
//! Two formats: the bare entry array ([`Executor::serialize_history`]) and
//! the full state payload `{ value, initialValue, history, redoStack }`
//! ([`Executor::export_history`]). Payloads are validated completely before
//! any state changes.

use crate::error::EngineError;
use crate::executor::Executor;
use crate::options::HistoryValue;
use rewind_core::{
    check_unique_indices, parse_entries, serialize_entries, snapshot, StatePayload,
};
use std::path::Path;

impl<A, V: HistoryValue> Executor<A, V> {
    /// Serialize the history entries as a JSON array
    pub fn serialize_history(&self) -> Result<String, EngineError> {
        Ok(serialize_entries(&self.timeline.to_vec())?)
    }

    /// Replace history from a JSON entry array
    ///
    /// The current value moves to the last entry and the redo buffer is
    /// cleared. Ignored when history is disabled.
    pub fn deserialize_history(&mut self, json: &str) -> Result<Option<V>, EngineError> {
        if !self.recorder.store_history() {
            return Ok(self.value());
        }
        let mut entries = match parse_entries::<V>(json) {
            Ok(entries) => entries,
            Err(e) => {
                self.profile.route(&self.id, e.into())?;
                return Ok(self.value());
            }
        };
        self.number(&mut entries);
        self.timeline.restore(entries, Vec::new());
        self.sync_to_last();
        tracing::info!(executor = %self.id, len = self.timeline.len(), "history deserialized");
        self.changed();
        Ok(self.value())
    }

    /// Snapshot the full engine-visible state
    pub fn export_state(&self) -> StatePayload<V> {
        StatePayload {
            value: self.value(),
            initial_value: self.initial_value(),
            history: self.timeline.to_vec(),
            redo_stack: self.timeline.redo_stack().to_vec(),
        }
    }

    pub fn export_history(&self) -> Result<String, EngineError> {
        Ok(self.export_state().to_json()?)
    }

    /// Replace value, initial value, history and redo buffer
    pub fn import_state(&mut self, payload: StatePayload<V>) -> Result<Option<V>, EngineError> {
        let check = check_unique_indices(payload.history.iter().chain(payload.redo_stack.iter()));
        if let Err(e) = check {
            self.profile.route(&self.id, e.into())?;
            return Ok(self.value());
        }
        self.apply_state(payload);
        Ok(self.value())
    }

    pub fn import_history(&mut self, json: &str) -> Result<Option<V>, EngineError> {
        match StatePayload::<V>::from_json(json) {
            Ok(payload) => {
                self.apply_state(payload);
                Ok(self.value())
            }
            Err(e) => {
                self.profile.route(&self.id, e.into())?;
                Ok(self.value())
            }
        }
    }

    pub(crate) fn apply_state(&mut self, payload: StatePayload<V>) {
        let StatePayload {
            value,
            initial_value,
            mut history,
            mut redo_stack,
        } = payload;
        if self.recorder.store_history() {
            self.number(&mut history);
            self.number(&mut redo_stack);
            self.timeline.restore(history, redo_stack);
        }
        self.value = value.as_ref().map(snapshot);
        self.initial = initial_value.as_ref().map(snapshot);
        tracing::info!(
            executor = %self.id,
            len = self.timeline.len(),
            redo = self.timeline.redo_stack().len(),
            "state imported"
        );
        self.changed();
    }

    /// Write the full state payload to a file
    pub fn save_state(&self, path: &Path) -> Result<(), EngineError> {
        let json = self.export_history()?;
        std::fs::write(path, json).map_err(|e| EngineError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::info!(executor = %self.id, path = %path.display(), "state saved");
        Ok(())
    }

    /// Read a full state payload from a file
    pub fn load_state(&mut self, path: &Path) -> Result<Option<V>, EngineError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                let err = EngineError::Io {
                    path: path.display().to_string(),
                    source: e,
                };
                self.profile.route(&self.id, err)?;
                return Ok(self.value());
            }
        };
        self.import_history(&json)
    }
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
