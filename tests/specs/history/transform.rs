//! Sort, split, merge and copy tests.

use crate::prelude::*;
use similar_asserts::assert_eq;
use rewind_core::{MergeOptions, SplitRange};

fn abcde(tick: &ManualTick) -> Executor<i64, i64> {
    let mut exec = identity(tick).build().unwrap();
    for x in [10, 20, 30, 40, 50] {
        exec.invoke(x).unwrap();
    }
    exec
}

#[test]
fn default_sort_restores_insertion_order() {
    let tick = ManualTick::new();
    let mut exec = identity(&tick).build().unwrap();
    for x in [5, 1, 4, 2] {
        exec.invoke(x).unwrap();
    }
    for order in [SortOrder::Asc, SortOrder::Desc, SortOrder::GroupAsc] {
        exec.sort(order);
        exec.sort(SortOrder::Default);
        assert_eq!(history(&exec), vec![5, 1, 4, 2]);
    }
}

#[test]
fn split_selects_spans() {
    let tick = ManualTick::new();
    let exec = abcde(&tick);
    let peers = exec.split([SplitRange::Span(0, 2), SplitRange::Span(3, 4)]);
    assert_eq!(history(&peers[0]), vec![10, 20, 30]);
    assert_eq!(history(&peers[1]), vec![40, 50]);

    let backwards = exec.split([SplitRange::Span(4, 2)]);
    assert_eq!(history(&backwards[0]), vec![50, 40, 30]);
}

#[test]
fn merged_entries_sort_after_local_ones() {
    let tick = ManualTick::new();
    let mut exec = abcde(&tick);
    let other = abcde(&tick);
    let incoming: Vec<Entry<i64>> = other.get_history().into_iter().take(2).collect();

    exec.merge(vec![incoming], MergeOptions::default());
    exec.sort(SortOrder::Desc);
    exec.sort(SortOrder::Default);
    assert_eq!(history(&exec), vec![10, 20, 30, 40, 50, 10, 20]);
}

#[test]
fn copy_takes_a_deep_copy() {
    let tick = ManualTick::new();
    let mut source = abcde(&tick);
    let mut target = identity(&tick).build().unwrap();

    target.copy(vec![source.get_history()]);
    source.replace_at(0, 99).unwrap();
    assert_eq!(history(&target), vec![10, 20, 30, 40, 50]);
}
