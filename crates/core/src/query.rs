// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured read-only history queries

use crate::entry::Entry;
use serde::{Deserialize, Serialize};

/// Query over entries; every set field must match
///
/// Timestamp bounds are exclusive for `after`/`before` and inclusive for
/// `range`. Entries without a timestamp never satisfy a time bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(i64, i64)>,
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn after(mut self, millis: i64) -> Self {
        self.after = Some(millis);
        self
    }

    pub fn before(mut self, millis: i64) -> Self {
        self.before = Some(millis);
        self
    }

    pub fn range(mut self, from: i64, to: i64) -> Self {
        self.range = Some((from, to));
        self
    }

    pub fn matches<V>(&self, entry: &Entry<V>) -> bool {
        if let Some(group) = &self.group {
            if entry.group.as_ref() != Some(group) {
                return false;
            }
        }
        if let Some(meta) = &self.meta {
            if entry.meta.as_ref() != Some(meta) {
                return false;
            }
        }
        let needs_time = self.after.is_some() || self.before.is_some() || self.range.is_some();
        if !needs_time {
            return true;
        }
        let Some(time) = entry.time else {
            return false;
        };
        self.after.map_or(true, |a| time > a)
            && self.before.map_or(true, |b| time < b)
            && self.range.map_or(true, |(from, to)| time >= from && time <= to)
    }
}

/// Clone every entry accepted by `predicate`
pub fn filter_entries<'a, V, I, P>(entries: I, predicate: P) -> Vec<Entry<V>>
where
    V: Clone + 'a,
    I: IntoIterator<Item = &'a Entry<V>>,
    P: Fn(&Entry<V>) -> bool,
{
    entries
        .into_iter()
        .filter(|e| predicate(e))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
