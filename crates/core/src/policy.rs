// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording policy
//!
//! The [`Recorder`] decides whether a freshly computed value becomes an
//! entry. Checks run in a fixed order:
//!
//! 1. history disabled
//! 2. paused
//! 3. global duplicate suppression (`no_duplicate`)
//! 4. throttling (`history_step`)
//! 5. consecutive duplicate suppression (custom equality without `no_duplicate`)
//!
//! The throttle counter advances for every candidate that reaches step 4,
//! whether or not step 5 later drops it.

use crate::clock::Clock;
use crate::entry::Entry;
use crate::value::{snapshot, Equality};
use std::fmt;
use std::sync::Arc;

/// Produces entry metadata from a value
pub type MetadataFn<V> = Arc<dyn Fn(&V) -> serde_json::Value + Send + Sync>;
/// Produces an entry group label from a value
pub type GroupFn<V> = Arc<dyn Fn(&V) -> String + Send + Sync>;

/// Outcome of offering a candidate to the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Disabled,
    Paused,
    Duplicate,
    Throttled,
    Repeat,
}

impl Admission {
    pub fn is_accepted(self) -> bool {
        self == Admission::Accepted
    }
}

/// Which duplicate pass applies to a set of entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep everything
    None,
    /// Drop an entry equal to its predecessor
    Consecutive,
    /// Drop an entry equal to any earlier entry
    Global,
}

/// Metadata and group producers
pub struct Tagging<V> {
    pub metadata: Option<MetadataFn<V>>,
    pub group_by: Option<GroupFn<V>>,
}

impl<V> Clone for Tagging<V> {
    fn clone(&self) -> Self {
        Self {
            metadata: self.metadata.clone(),
            group_by: self.group_by.clone(),
        }
    }
}

impl<V> Default for Tagging<V> {
    fn default() -> Self {
        Self {
            metadata: None,
            group_by: None,
        }
    }
}

impl<V> Tagging<V> {
    /// Recompute meta and group for an entry from its current value
    pub fn retag(&self, entry: &mut Entry<V>) {
        entry.meta = self.metadata.as_ref().map(|f| f(&entry.value));
        entry.group = self.group_by.as_ref().map(|f| f(&entry.value));
    }
}

/// Recorder settings that do not change after construction
pub struct RecorderSettings<V> {
    pub store_history: bool,
    pub no_duplicate: bool,
    pub history_step: u64,
    pub equality: Equality<V>,
    pub tagging: Tagging<V>,
}

impl<V> Clone for RecorderSettings<V> {
    fn clone(&self) -> Self {
        Self {
            store_history: self.store_history,
            no_duplicate: self.no_duplicate,
            history_step: self.history_step,
            equality: self.equality.clone(),
            tagging: self.tagging.clone(),
        }
    }
}

impl<V> Default for RecorderSettings<V> {
    fn default() -> Self {
        Self {
            store_history: true,
            no_duplicate: false,
            history_step: 1,
            equality: Equality::structural(),
            tagging: Tagging::default(),
        }
    }
}

/// Per-instance recording state: policy, pause flag, throttle counter and
/// the insertion index counter
pub struct Recorder<V> {
    settings: RecorderSettings<V>,
    paused: bool,
    calls: u64,
    next_index: u64,
}

impl<V> fmt::Debug for Recorder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("store_history", &self.settings.store_history)
            .field("no_duplicate", &self.settings.no_duplicate)
            .field("history_step", &self.settings.history_step)
            .field("paused", &self.paused)
            .field("calls", &self.calls)
            .field("next_index", &self.next_index)
            .finish()
    }
}

impl<V: Clone + PartialEq> Recorder<V> {
    pub fn new(settings: RecorderSettings<V>) -> Self {
        Self {
            settings,
            paused: false,
            calls: 0,
            next_index: 0,
        }
    }

    pub fn settings(&self) -> &RecorderSettings<V> {
        &self.settings
    }

    pub fn store_history(&self) -> bool {
        self.settings.store_history
    }

    pub fn equality(&self) -> &Equality<V> {
        &self.settings.equality
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Duplicate pass used for sort and merge
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        if self.settings.no_duplicate {
            DuplicatePolicy::Global
        } else if self.settings.equality.is_custom() {
            DuplicatePolicy::Consecutive
        } else {
            DuplicatePolicy::None
        }
    }

    /// Steps 1 and 2: checks that need no history
    pub fn gate(&self) -> Option<Admission> {
        if !self.settings.store_history {
            Some(Admission::Disabled)
        } else if self.paused {
            Some(Admission::Paused)
        } else {
            None
        }
    }

    /// Whether [`admit`](Self::admit) needs the whole history rather than
    /// just the latest entry
    pub fn needs_full_scan(&self) -> bool {
        self.settings.no_duplicate
    }

    /// Run the full policy against a candidate
    ///
    /// `existing` yields the values currently in history, oldest first.
    pub fn admit<'a, I>(&mut self, candidate: &V, mut existing: I) -> Admission
    where
        I: DoubleEndedIterator<Item = &'a V>,
        V: 'a,
    {
        if let Some(blocked) = self.gate() {
            return blocked;
        }

        let eq = &self.settings.equality;
        if self.settings.no_duplicate && existing.any(|v| eq.same(v, candidate)) {
            return Admission::Duplicate;
        }

        self.calls += 1;
        if self.calls % self.settings.history_step.max(1) != 0 {
            return Admission::Throttled;
        }

        if !self.settings.no_duplicate && eq.is_custom() {
            if let Some(last) = existing.next_back() {
                if eq.same(last, candidate) {
                    return Admission::Repeat;
                }
            }
        }

        Admission::Accepted
    }

    /// Build a fully tagged entry with the next insertion index
    pub fn stamp(&mut self, value: &V, clock: &dyn Clock) -> Entry<V> {
        let mut entry = Entry::new(snapshot(value))
            .with_index(self.take_index())
            .with_time(clock.now_millis());
        self.settings.tagging.retag(&mut entry);
        entry
    }

    /// Recompute meta and group after a value changed in place
    pub fn retag(&self, entry: &mut Entry<V>) {
        self.settings.tagging.retag(entry);
    }

    pub fn take_index(&mut self) -> u64 {
        let index = self.next_index;
        self.next_index = self.next_index.saturating_add(1);
        index
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Keep the counter ahead of indices that arrived from outside
    pub fn observe_index(&mut self, index: u64) {
        if index >= self.next_index {
            self.next_index = index.saturating_add(1);
        }
    }

    /// Give an entry a fresh index, and a timestamp if it has none
    pub fn renumber(&mut self, entry: &mut Entry<V>, clock: &dyn Clock) {
        entry.index = Some(self.take_index());
        if entry.time.is_none() {
            entry.time = Some(clock.now_millis());
        }
    }

    /// Fork the settings for a peer instance; counters start fresh
    pub fn fork(&self) -> Self {
        Self::new(self.settings.clone())
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
