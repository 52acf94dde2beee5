// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bulk operations over entry lists: sort, deduplicate, merge and range
//! selection
//!
//! These are pure functions over `Vec<Entry<V>>`; the engines decide which
//! entries to hand in and what to do with the result.

use crate::entry::Entry;
use crate::policy::DuplicatePolicy;
use crate::value::{compare_values, Equality};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Built-in sort orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    /// Insertion index ascending; undoes any earlier sort
    #[default]
    Default,
    Asc,
    Desc,
    /// Group label, then value
    GroupAsc,
    GroupDesc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(SortOrder::Default),
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            "groupAsc" => Ok(SortOrder::GroupAsc),
            "groupDesc" => Ok(SortOrder::GroupDesc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortOrder::Default => "default",
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
            SortOrder::GroupAsc => "groupAsc",
            SortOrder::GroupDesc => "groupDesc",
        };
        write!(f, "{}", name)
    }
}

/// Stable sort by one of the built-in orders
pub fn sort_entries<V: Serialize>(entries: &mut [Entry<V>], order: SortOrder) {
    match order {
        SortOrder::Default => entries.sort_by_key(|e| e.index.unwrap_or(u64::MAX)),
        SortOrder::Asc => entries.sort_by(|a, b| compare_values(&a.value, &b.value)),
        SortOrder::Desc => entries.sort_by(|a, b| compare_values(&b.value, &a.value)),
        SortOrder::GroupAsc => entries.sort_by(by_group),
        SortOrder::GroupDesc => entries.sort_by(|a, b| by_group(b, a)),
    }
}

fn by_group<V: Serialize>(a: &Entry<V>, b: &Entry<V>) -> Ordering {
    a.group
        .cmp(&b.group)
        .then_with(|| compare_values(&a.value, &b.value))
}

/// Drop duplicates under the given policy, keeping first occurrences
pub fn dedupe<V: PartialEq>(
    entries: Vec<Entry<V>>,
    policy: DuplicatePolicy,
    eq: &Equality<V>,
) -> Vec<Entry<V>> {
    if policy == DuplicatePolicy::None {
        return entries;
    }
    let mut kept: Vec<Entry<V>> = Vec::with_capacity(entries.len());
    for entry in entries {
        let duplicate = match policy {
            DuplicatePolicy::Global => kept.iter().any(|k| eq.same(&k.value, &entry.value)),
            DuplicatePolicy::Consecutive => kept
                .last()
                .is_some_and(|k| eq.same(&k.value, &entry.value)),
            DuplicatePolicy::None => false,
        };
        if !duplicate {
            kept.push(entry);
        }
    }
    kept
}

/// Where merged entries are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePosition {
    Start,
    #[default]
    End,
    /// Before the entry currently at this index (clamped to the length)
    At(usize),
}

/// Merge settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOptions {
    pub position: MergePosition,
    /// Replace an existing duplicate in place instead of skipping the
    /// incoming entry
    pub overwrite: bool,
}

/// Counts reported by [`merge_into`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    pub inserted: usize,
    pub overwritten: usize,
    pub skipped: usize,
}

/// Splice the flattened `histories` into `target`
///
/// Each incoming entry is checked against the existing entries and the
/// already accepted part of the batch. `accept` is called on every entry
/// that lands in `target`, in placement order.
pub fn merge_into<V: PartialEq>(
    target: &mut Vec<Entry<V>>,
    histories: Vec<Vec<Entry<V>>>,
    options: MergeOptions,
    policy: DuplicatePolicy,
    eq: &Equality<V>,
    accept: &mut dyn FnMut(&mut Entry<V>),
) -> MergeReport {
    let at = match options.position {
        MergePosition::Start => 0,
        MergePosition::End => target.len(),
        MergePosition::At(i) => i.min(target.len()),
    };

    let mut report = MergeReport::default();
    let mut batch: Vec<Entry<V>> = Vec::new();

    for entry in histories.into_iter().flatten() {
        let existing_match = match policy {
            DuplicatePolicy::Global => target.iter().position(|t| eq.same(&t.value, &entry.value)),
            DuplicatePolicy::Consecutive if batch.is_empty() && at > 0 => {
                let before = at - 1;
                target
                    .get(before)
                    .filter(|t| eq.same(&t.value, &entry.value))
                    .map(|_| before)
            }
            _ => None,
        };
        let batch_duplicate = match policy {
            DuplicatePolicy::Global => batch.iter().any(|b| eq.same(&b.value, &entry.value)),
            DuplicatePolicy::Consecutive => batch
                .last()
                .is_some_and(|b| eq.same(&b.value, &entry.value)),
            DuplicatePolicy::None => false,
        };

        if let Some(pos) = existing_match {
            if options.overwrite {
                let slot = &mut target[pos];
                slot.value = entry.value;
                slot.meta = entry.meta;
                slot.group = entry.group;
                report.overwritten += 1;
            } else {
                report.skipped += 1;
            }
            continue;
        }
        if batch_duplicate {
            report.skipped += 1;
            continue;
        }

        batch.push(entry);
    }

    // the splice must not end next to an equal entry either
    if policy == DuplicatePolicy::Consecutive {
        while let Some(last) = batch.last() {
            if !target.get(at).is_some_and(|t| eq.same(&t.value, &last.value)) {
                break;
            }
            let Some(entry) = batch.pop() else { break };
            if options.overwrite {
                let slot = &mut target[at];
                slot.value = entry.value;
                slot.meta = entry.meta;
                slot.group = entry.group;
                report.overwritten += 1;
            } else {
                report.skipped += 1;
            }
        }
    }

    for entry in batch.iter_mut() {
        accept(entry);
    }
    report.inserted = batch.len();
    let tail = target.split_off(at);
    target.extend(batch);
    target.extend(tail);
    report
}

/// A selection of entries for `split`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitRange {
    /// Inclusive span; `start > end` walks backwards
    Span(usize, usize),
    /// Explicit positions in the order listed
    Indices(Vec<usize>),
}

impl From<(usize, usize)> for SplitRange {
    fn from((start, end): (usize, usize)) -> Self {
        SplitRange::Span(start, end)
    }
}

impl From<RangeInclusive<usize>> for SplitRange {
    fn from(range: RangeInclusive<usize>) -> Self {
        SplitRange::Span(*range.start(), *range.end())
    }
}

impl From<Vec<usize>> for SplitRange {
    fn from(indices: Vec<usize>) -> Self {
        SplitRange::Indices(indices)
    }
}

impl SplitRange {
    /// Positions selected by this range, in output order
    pub fn positions(&self) -> Vec<usize> {
        match self {
            SplitRange::Span(start, end) if start <= end => (*start..=*end).collect(),
            SplitRange::Span(start, end) => (*end..=*start).rev().collect(),
            SplitRange::Indices(indices) => indices.clone(),
        }
    }
}

/// Clone the entries a range selects; positions past the end are skipped
pub fn select<V: Clone>(entries: &[Entry<V>], range: &SplitRange) -> Vec<Entry<V>> {
    range
        .positions()
        .into_iter()
        .filter_map(|i| entries.get(i).cloned())
        .collect()
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
