// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serialized forms of history
//!
//! Two documents round-trip through JSON:
//!
//! - an entry array (`serialize_entries` / `parse_entries`)
//! - the full engine-visible state, [`StatePayload`]:
//!   `{ value, initialValue, history, redoStack }`
//!
//! Parsing validates the whole document before anything is handed back, so
//! a caller that only mutates on `Ok` gets all-or-nothing imports.

use crate::entry::Entry;
use crate::error::PayloadError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Full engine state as exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "V: DeserializeOwned"))]
pub struct StatePayload<V> {
    #[serde(default)]
    pub value: Option<V>,
    #[serde(default)]
    pub initial_value: Option<V>,
    pub history: Vec<Entry<V>>,
    #[serde(default)]
    pub redo_stack: Vec<Entry<V>>,
}

impl<V: Serialize + DeserializeOwned> StatePayload<V> {
    pub fn to_json(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a full-state document
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        let payload: Self = serde_json::from_str(json)?;
        check_unique_indices(payload.history.iter().chain(payload.redo_stack.iter()))?;
        Ok(payload)
    }
}

/// Serialize an entry array
pub fn serialize_entries<V: Serialize>(entries: &[Entry<V>]) -> Result<String, PayloadError> {
    Ok(serde_json::to_string(entries)?)
}

/// Parse and validate an entry array
pub fn parse_entries<V: DeserializeOwned>(json: &str) -> Result<Vec<Entry<V>>, PayloadError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if !value.is_array() {
        return Err(PayloadError::Invalid(
            "expected an array of entries".to_string(),
        ));
    }
    let entries: Vec<Entry<V>> = serde_json::from_value(value)?;
    check_unique_indices(entries.iter())?;
    Ok(entries)
}

/// Reject documents where two entries claim the same insertion index
///
/// `u64::MAX` is reserved: the counter must always have a next index.
pub fn check_unique_indices<'a, V: 'a>(
    entries: impl Iterator<Item = &'a Entry<V>>,
) -> Result<(), PayloadError> {
    let mut seen = HashSet::new();
    for index in entries.filter_map(|e| e.index) {
        if index == u64::MAX {
            return Err(PayloadError::Invalid(format!(
                "insertion index {index} is out of range"
            )));
        }
        if !seen.insert(index) {
            return Err(PayloadError::DuplicateIndex { index });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
