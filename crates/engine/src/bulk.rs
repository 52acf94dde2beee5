// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bulk history operations on the single-tier engine

use crate::executor::Executor;
use crate::options::HistoryValue;
use rewind_core::{
    dedupe, filter_entries, merge_into, select, sort_entries, Entry, HistoryQuery, MergeOptions,
    MergeReport, SortOrder, SplitRange,
};
use std::cmp::Ordering;
use std::sync::Arc;

impl<A, V: HistoryValue> Executor<A, V> {
    /// Reorder history by a built-in order, then drop duplicates under the
    /// configured policy
    ///
    /// `SortOrder::Default` restores insertion order.
    pub fn sort(&mut self, order: SortOrder) -> Option<V> {
        let mut entries = self.timeline.to_vec();
        sort_entries(&mut entries, order);
        tracing::debug!(executor = %self.id, %order, "sorted");
        self.finish_reorder(entries)
    }

    /// Reorder history with a caller-supplied comparator
    pub fn sort_by<F>(&mut self, compare: F) -> Option<V>
    where
        F: FnMut(&Entry<V>, &Entry<V>) -> Ordering,
    {
        let mut entries = self.timeline.to_vec();
        entries.sort_by(compare);
        tracing::debug!(executor = %self.id, "sorted by comparator");
        self.finish_reorder(entries)
    }

    fn finish_reorder(&mut self, entries: Vec<Entry<V>>) -> Option<V> {
        let before = entries.len();
        let entries = dedupe(
            entries,
            self.recorder.duplicate_policy(),
            self.recorder.equality(),
        );
        if entries.len() < before {
            tracing::debug!(
                executor = %self.id,
                dropped = before - entries.len(),
                "duplicates dropped after sort"
            );
        }
        self.timeline.set_entries(entries);
        self.sync_to_last();
        self.changed();
        self.value()
    }

    /// Splice externally supplied entries into history
    ///
    /// Incoming entries are checked against existing history and the rest
    /// of the batch, then given fresh local insertion indices.
    pub fn merge(&mut self, histories: Vec<Vec<Entry<V>>>, options: MergeOptions) -> MergeReport {
        if !self.recorder.store_history() {
            tracing::debug!(executor = %self.id, "merge ignored; history disabled");
            return MergeReport::default();
        }
        let mut target = self.timeline.to_vec();
        let policy = self.recorder.duplicate_policy();
        let eq = self.recorder.equality().clone();
        let clock = Arc::clone(&self.profile.clock);
        let recorder = &mut self.recorder;
        let mut renumber = |entry: &mut Entry<V>| recorder.renumber(entry, clock.as_ref());
        let report = merge_into(&mut target, histories, options, policy, &eq, &mut renumber);
        tracing::info!(
            executor = %self.id,
            inserted = report.inserted,
            overwritten = report.overwritten,
            skipped = report.skipped,
            "merged"
        );
        self.timeline.set_entries(target);
        self.sync_to_last();
        self.changed();
        report
    }

    /// Replace history with the deduplicated union of `histories`
    ///
    /// The redo buffer is cleared and the bound applied.
    pub fn copy(&mut self, histories: Vec<Vec<Entry<V>>>) -> Option<V> {
        if !self.recorder.store_history() {
            tracing::debug!(executor = %self.id, "copy ignored; history disabled");
            return self.value();
        }
        let entries: Vec<Entry<V>> = histories.into_iter().flatten().collect();
        let mut entries = dedupe(
            entries,
            self.recorder.duplicate_policy(),
            self.recorder.equality(),
        );
        for entry in entries.iter_mut() {
            self.recorder.renumber(entry, self.profile.clock.as_ref());
        }
        self.timeline.restore(entries, Vec::new());
        tracing::info!(executor = %self.id, len = self.timeline.len(), "copied");
        self.sync_to_last();
        self.changed();
        self.value()
    }

    /// Build one independent engine per range
    ///
    /// Each peer shares this engine's callback and options and starts with
    /// exactly the selected entries, in range order.
    pub fn split<I>(&self, ranges: I) -> Vec<Executor<A, V>>
    where
        I: IntoIterator,
        I::Item: Into<SplitRange>,
    {
        let entries = self.timeline.to_vec();
        ranges
            .into_iter()
            .map(|range| {
                let range = range.into();
                let peer = self.peer(select(&entries, &range));
                tracing::debug!(
                    executor = %self.id,
                    peer = %peer.id,
                    len = peer.len(),
                    ?range,
                    "split"
                );
                peer
            })
            .collect()
    }

    /// Entries accepted by `predicate`; history is untouched
    pub fn filter_history<P>(&self, predicate: P) -> Vec<Entry<V>>
    where
        P: Fn(&Entry<V>) -> bool,
    {
        filter_entries(self.timeline.entries(), predicate)
    }

    /// Entries matching a structured query; history is untouched
    pub fn query_history(&self, query: &HistoryQuery) -> Vec<Entry<V>> {
        filter_entries(self.timeline.entries(), |e| query.matches(e))
    }
}

#[cfg(test)]
#[path = "bulk_tests.rs"]
mod tests;
