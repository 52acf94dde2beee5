// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! History entry model
//!
//! An [`Entry`] is one recorded snapshot of a value plus its metadata,
//! group label, insertion index and timestamp. The insertion index is the
//! only stable key for restoring recording order after a sort.
//!
//! The serialized layout is `{ value, meta?, group?, _index?, _time? }`.

use serde::{Deserialize, Serialize};

/// A single recorded snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<V> {
    /// Owned copy of the value at record time
    pub value: V,
    /// Output of the metadata producer, if one is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    /// Output of the grouping producer, if one is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Monotonic insertion index, unique per engine instance
    #[serde(rename = "_index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    /// Milliseconds since the Unix epoch
    #[serde(rename = "_time", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
}

impl<V> Entry<V> {
    /// Bare entry with no metadata, group, index or timestamp
    pub fn new(value: V) -> Self {
        Self {
            value,
            meta: None,
            group: None,
            index: None,
            time: None,
        }
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_time(mut self, millis: i64) -> Self {
        self.time = Some(millis);
        self
    }

    /// Insertion index used as the durable key, `0` when unassigned
    pub fn key(&self) -> u64 {
        self.index.unwrap_or(0)
    }
}

impl<V> From<V> for Entry<V> {
    fn from(value: V) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
