// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::options::ExecutorBuilder;
use rewind_core::{FakeClock, ManualTick, MergePosition, SequentialIdGen};
use yare::parameterized;

fn builder() -> ExecutorBuilder<i64, i64> {
    Executor::builder(|x: i64| Ok(x))
        .clock(Arc::new(FakeClock::new()))
        .id_gen(Arc::new(SequentialIdGen::new("bulk")))
        .scheduler(Arc::new(ManualTick::new()))
}

fn with_values(builder: ExecutorBuilder<i64, i64>, xs: &[i64]) -> Executor<i64, i64> {
    let mut exec = builder.build().unwrap();
    for &x in xs {
        exec.invoke(x).unwrap();
    }
    exec
}

fn values(entries: &[Entry<i64>]) -> Vec<i64> {
    entries.iter().map(|e| e.value).collect()
}

fn history(exec: &Executor<i64, i64>) -> Vec<i64> {
    values(&exec.get_history())
}

fn bare(xs: &[i64]) -> Vec<Entry<i64>> {
    xs.iter().map(|&x| Entry::new(x)).collect()
}

// =============================================================================
// Sort
// =============================================================================

#[parameterized(
    asc = { SortOrder::Asc, vec![1, 2, 3], 3 },
    desc = { SortOrder::Desc, vec![3, 2, 1], 1 },
    default = { SortOrder::Default, vec![3, 1, 2], 2 },
)]
fn sort_orders_history(order: SortOrder, expected: Vec<i64>, value: i64) {
    let mut exec = with_values(builder(), &[3, 1, 2]);
    assert_eq!(exec.sort(order), Some(value));
    assert_eq!(history(&exec), expected);
}

#[test]
fn default_sort_restores_insertion_order() {
    let mut exec = with_values(builder(), &[3, 1, 2]);
    exec.sort(SortOrder::Desc);
    exec.sort(SortOrder::Default);
    assert_eq!(history(&exec), vec![3, 1, 2]);
}

#[test]
fn group_sort_orders_by_label_then_value() {
    let b = builder().group_by(|v: &i64| if v % 2 == 0 { "even" } else { "odd" }.to_string());
    let mut exec = with_values(b, &[3, 4, 1, 2]);

    exec.sort(SortOrder::GroupAsc);
    assert_eq!(history(&exec), vec![2, 4, 1, 3]);

    exec.sort(SortOrder::GroupDesc);
    assert_eq!(history(&exec), vec![3, 1, 4, 2]);
}

#[test]
fn sort_drops_duplicates_brought_together() {
    let b = builder().equality(|a: &i64, b: &i64| a % 10 == b % 10);
    let mut exec = with_values(b, &[11, 3, 21]);
    assert_eq!(history(&exec), vec![11, 3, 21]);

    assert_eq!(exec.sort(SortOrder::Asc), Some(11));
    assert_eq!(history(&exec), vec![3, 11]);
}

#[test]
fn sort_keeps_redo_stack() {
    let mut exec = with_values(builder(), &[3, 1, 2]);
    exec.undo(1);
    exec.sort(SortOrder::Asc);
    assert_eq!(values(&exec.redo_stack()), vec![2]);
}

#[test]
fn sort_by_uses_comparator() {
    let mut exec = with_values(builder(), &[-3, 1, -2]);
    exec.sort_by(|a, b| a.value.abs().cmp(&b.value.abs()));
    assert_eq!(history(&exec), vec![1, -2, -3]);
    assert_eq!(exec.value(), Some(-3));
}

// =============================================================================
// Merge
// =============================================================================

#[parameterized(
    end = { MergePosition::End, vec![1, 2, 8, 9] },
    start = { MergePosition::Start, vec![8, 9, 1, 2] },
    middle = { MergePosition::At(1), vec![1, 8, 9, 2] },
    clamped = { MergePosition::At(10), vec![1, 2, 8, 9] },
)]
fn merge_places_entries(position: MergePosition, expected: Vec<i64>) {
    let mut exec = with_values(builder(), &[1, 2]);
    let report = exec.merge(
        vec![bare(&[8]), bare(&[9])],
        MergeOptions {
            position,
            overwrite: false,
        },
    );
    assert_eq!(report.inserted, 2);
    assert_eq!(history(&exec), expected);
    assert_eq!(exec.value(), expected.last().copied());
}

#[test]
fn merge_assigns_fresh_indices() {
    let mut exec = with_values(builder(), &[1, 2]);
    let incoming = vec![Entry::new(5).with_index(0), Entry::new(6).with_index(1)];
    exec.merge(vec![incoming], MergeOptions::default());

    let indices: Vec<Option<u64>> = exec.get_history().iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![Some(0), Some(1), Some(2), Some(3)]);
}

#[test]
fn merge_skips_duplicates_under_no_duplicate() {
    let b = builder().no_duplicate(true);
    let mut exec = with_values(b, &[1, 2]);
    let report = exec.merge(vec![bare(&[2, 3, 3])], MergeOptions::default());

    assert_eq!(report.skipped, 2);
    assert_eq!(report.inserted, 1);
    assert_eq!(history(&exec), vec![1, 2, 3]);
}

#[test]
fn merge_overwrite_replaces_duplicate_in_place() {
    let b = builder()
        .no_duplicate(true)
        .equality(|a: &i64, b: &i64| a / 10 == b / 10);
    let mut exec = with_values(b, &[10, 20]);
    let before = exec.get_history()[0].clone();

    let report = exec.merge(
        vec![bare(&[15, 30])],
        MergeOptions {
            position: MergePosition::End,
            overwrite: true,
        },
    );
    assert_eq!(report.overwritten, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(history(&exec), vec![15, 20, 30]);
    assert_eq!(exec.get_history()[0].index, before.index);
}

#[test]
fn merge_is_ignored_without_history() {
    let mut exec = with_values(builder().store_history(false), &[1]);
    let report = exec.merge(vec![bare(&[2])], MergeOptions::default());
    assert_eq!(report, MergeReport::default());
    assert!(exec.is_empty());
}

// =============================================================================
// Copy
// =============================================================================

#[test]
fn copy_replaces_history_and_clears_redo() {
    let mut exec = with_values(builder(), &[1, 2, 3]);
    exec.undo(1);

    assert_eq!(exec.copy(vec![bare(&[5, 6]), bare(&[7])]), Some(7));
    assert_eq!(history(&exec), vec![5, 6, 7]);
    assert!(exec.redo_stack().is_empty());
}

#[test]
fn copy_applies_bound_and_dedupes() {
    let b = builder().max_history(2).no_duplicate(true);
    let mut exec = with_values(b, &[1]);
    exec.copy(vec![bare(&[5, 6]), bare(&[5, 7])]);
    assert_eq!(history(&exec), vec![6, 7]);
}

#[test]
fn copy_renumbers_entries() {
    let mut exec = with_values(builder(), &[1]);
    let incoming = vec![Entry::new(5).with_index(0), Entry::new(6).with_index(0)];
    exec.copy(vec![incoming]);

    let indices: Vec<Option<u64>> = exec.get_history().iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![Some(1), Some(2)]);
}

// =============================================================================
// Split
// =============================================================================

#[test]
fn split_spans_forward_and_backward() {
    let exec = with_values(builder(), &[10, 11, 12, 13, 14]);
    let ranges: [(usize, usize); 3] = [(0, 2), (3, 4), (4, 2)];
    let peers = exec.split(ranges);

    assert_eq!(peers.len(), 3);
    assert_eq!(history(&peers[0]), vec![10, 11, 12]);
    assert_eq!(history(&peers[1]), vec![13, 14]);
    assert_eq!(history(&peers[2]), vec![14, 13, 12]);
    assert_eq!(peers[2].value(), Some(12));
    assert_eq!(peers[2].initial_value(), Some(14));
}

#[test]
fn split_by_positions_skips_out_of_range() {
    let exec = with_values(builder(), &[10, 11, 12]);
    let peers = exec.split([SplitRange::Indices(vec![2, 0, 9])]);
    assert_eq!(history(&peers[0]), vec![12, 10]);
}

#[test]
fn split_peers_are_independent() {
    let mut exec = with_values(builder(), &[1, 2, 3]);
    let mut peers = exec.split([SplitRange::Span(0, 1)]);
    let peer = &mut peers[0];
    assert_ne!(peer.id(), exec.id());

    peer.invoke(7).unwrap();
    exec.undo(1);
    assert_eq!(history(peer), vec![1, 2, 7]);
    assert_eq!(history(&exec), vec![1, 2]);
    assert!(peer.get_history()[2].index > peer.get_history()[1].index);
}

// =============================================================================
// Filter and query
// =============================================================================

#[test]
fn filter_history_leaves_history_untouched() {
    let exec = with_values(builder(), &[1, 2, 3, 4]);
    let even = exec.filter_history(|e| e.value % 2 == 0);
    assert_eq!(values(&even), vec![2, 4]);
    assert_eq!(exec.len(), 4);
}

#[test]
fn query_history_matches_group_and_time() {
    let clock = FakeClock::at(1_000);
    let b = builder()
        .clock(Arc::new(clock.clone()))
        .group_by(|v: &i64| if *v > 2 { "big" } else { "small" }.to_string());
    let mut exec = b.build().unwrap();
    for x in 1..=4 {
        exec.invoke(x).unwrap();
        clock.advance(std::time::Duration::from_millis(100));
    }

    let big = exec.query_history(&HistoryQuery::new().group("big"));
    assert_eq!(values(&big), vec![3, 4]);

    let window = exec.query_history(&HistoryQuery::new().range(1_100, 1_200));
    assert_eq!(values(&window), vec![2, 3]);
}
