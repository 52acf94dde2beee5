// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-tier timeline: an in-memory entry list with an explicit redo stack
//!
//! ```text
//! push(e4)            entries: [e0, e1, e2, e3, e4]   redo: []
//! undo(2)             entries: [e0, e1, e2]           redo: [e4, e3]
//! redo(1)             entries: [e0, e1, e2, e3]       redo: [e4]
//! push(e5)            entries: [e0, e1, e2, e3, e5]   redo: []
//! ```
//!
//! The redo stack keeps the most recently undone entry on top (at the back).
//! The cursor normally sits on the last entry; [`Timeline::seek`] moves it
//! without restructuring either list.

use crate::entry::Entry;
use std::collections::VecDeque;

/// Ordered entries plus redo stack and cursor
#[derive(Debug, Clone)]
pub struct Timeline<V> {
    entries: VecDeque<Entry<V>>,
    redo: Vec<Entry<V>>,
    cursor: Option<usize>,
    bound: Option<usize>,
}

impl<V> Default for Timeline<V> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<V> Timeline<V> {
    /// Create an empty timeline, optionally bounded to `bound` entries
    pub fn new(bound: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            redo: Vec::new(),
            cursor: None,
            bound: bound.map(|b| b.max(1)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bound(&self) -> Option<usize> {
        self.bound
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &Entry<V>> + '_ {
        self.entries.iter()
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.entries.iter().map(|e| &e.value)
    }

    pub fn get(&self, index: usize) -> Option<&Entry<V>> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&Entry<V>> {
        self.entries.back()
    }

    /// Entry under the cursor
    pub fn current(&self) -> Option<&Entry<V>> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    /// Redo stack, bottom first; the next entry to redo is last
    pub fn redo_stack(&self) -> &[Entry<V>] {
        &self.redo
    }

    /// Append a new entry, invalidating the redo stack
    ///
    /// Returns the number of entries evicted from the front by the bound.
    pub fn push(&mut self, entry: Entry<V>) -> usize {
        self.redo.clear();
        self.entries.push_back(entry);
        let evicted = self.enforce_bound();
        self.cursor_to_end();
        evicted
    }

    /// Move up to `steps` entries from the tail onto the redo stack
    ///
    /// The first entry is never undone. Returns the number moved.
    pub fn undo(&mut self, steps: usize) -> usize {
        let movable = self.entries.len().saturating_sub(1).min(steps);
        for _ in 0..movable {
            if let Some(entry) = self.entries.pop_back() {
                self.redo.push(entry);
            }
        }
        self.cursor_to_end();
        movable
    }

    /// Move up to `steps` entries from the redo stack back onto the tail
    pub fn redo(&mut self, steps: usize) -> usize {
        let movable = self.redo.len().min(steps);
        for _ in 0..movable {
            if let Some(entry) = self.redo.pop() {
                self.entries.push_back(entry);
            }
        }
        self.cursor_to_end();
        movable
    }

    /// Point the cursor at `index` without touching either list
    pub fn seek(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.cursor = Some(index);
        true
    }

    /// Overwrite the entry at `index`, returning the previous one
    pub fn replace(&mut self, index: usize, entry: Entry<V>) -> Option<Entry<V>> {
        let slot = self.entries.get_mut(index)?;
        Some(std::mem::replace(slot, entry))
    }

    /// Splice an entry in at `index` (`index == len` appends) and point the
    /// cursor at it
    pub fn insert(&mut self, index: usize, entry: Entry<V>) -> bool {
        if index > self.entries.len() {
            return false;
        }
        self.entries.insert(index, entry);
        self.cursor = Some(index);
        true
    }

    /// Delete the entry at `index`; the cursor returns to the tail
    pub fn remove(&mut self, index: usize) -> Option<Entry<V>> {
        let removed = self.entries.remove(index)?;
        self.cursor_to_end();
        Some(removed)
    }

    /// Replace the entry list, keeping the redo stack
    pub fn set_entries(&mut self, entries: Vec<Entry<V>>) {
        self.entries = entries.into();
        self.cursor_to_end();
    }

    /// Replace both lists, trimming entries to the bound
    pub fn restore(&mut self, entries: Vec<Entry<V>>, redo: Vec<Entry<V>>) {
        self.entries = entries.into();
        self.redo = redo;
        self.enforce_bound();
        self.cursor_to_end();
    }

    /// Drop everything, then hold a single entry
    pub fn reseed(&mut self, entry: Option<Entry<V>>) {
        self.entries.clear();
        self.redo.clear();
        if let Some(entry) = entry {
            self.entries.push_back(entry);
        }
        self.cursor_to_end();
    }

    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    /// Take all entries out as a contiguous vector
    pub fn to_vec(&self) -> Vec<Entry<V>>
    where
        V: Clone,
    {
        self.entries.iter().cloned().collect()
    }

    fn enforce_bound(&mut self) -> usize {
        let mut evicted = 0;
        if let Some(bound) = self.bound {
            while self.entries.len() > bound {
                self.entries.pop_front();
                evicted += 1;
            }
        }
        evicted
    }

    fn cursor_to_end(&mut self) {
        self.cursor = self.entries.len().checked_sub(1);
    }
}

#[cfg(test)]
#[path = "timeline_tests.rs"]
mod tests;
