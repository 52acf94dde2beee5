// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fast window: bounded, insertion-ordered entry buffer
//!
//! Holds the most recent `capacity` entries. Pushing past capacity evicts
//! the oldest entry from the window only; the durable tier keeps it.

use rewind_core::Entry;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct FastWindow<V> {
    entries: VecDeque<Entry<V>>,
    capacity: usize,
}

impl<V> FastWindow<V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append, returning the evicted entry if the window was full
    pub fn push(&mut self, entry: Entry<V>) -> Option<Entry<V>> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Look up by insertion index
    pub fn get(&self, key: u64) -> Option<&Entry<V>> {
        self.entries.iter().find(|e| e.key() == key)
    }

    pub fn contains(&self, key: u64) -> bool {
        self.get(key).is_some()
    }

    /// Overwrite a cached entry; returns false when it is not cached
    pub fn replace(&mut self, entry: Entry<V>) -> bool {
        let key = entry.key();
        match self.entries.iter_mut().find(|e| e.key() == key) {
            Some(slot) => {
                *slot = entry;
                true
            }
            None => false,
        }
    }

    /// Drop every cached entry whose key is listed
    pub fn remove(&mut self, keys: &[u64]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !keys.contains(&e.key()));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Refill from the tail of `entries`, keeping at most `capacity`
    pub fn refill(&mut self, entries: impl IntoIterator<Item = Entry<V>>) {
        self.entries.clear();
        for entry in entries {
            self.push(entry);
        }
    }

    pub fn keys(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.key()).collect()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Entry<V>> + '_ {
        self.entries.iter()
    }
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod tests;
