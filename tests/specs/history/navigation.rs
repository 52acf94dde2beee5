//! Undo, redo and jump tests.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn undo_then_redo_restores_value_from_any_depth() {
    for depth in 1..=4 {
        let tick = ManualTick::new();
        let mut exec = identity(&tick).build().unwrap();
        for x in 1..=5 {
            exec.invoke(x).unwrap();
        }
        exec.undo(4 - depth);
        let before = exec.value();
        let steps = depth.min(exec.len() - 1);
        exec.undo(steps);
        assert_eq!(exec.redo(steps), before);
    }
}

#[test]
fn recording_after_undo_invalidates_redo() {
    let tick = ManualTick::new();
    let mut exec = identity(&tick).build().unwrap();
    for x in 1..=3 {
        exec.invoke(x).unwrap();
    }
    exec.undo(1);
    exec.invoke(8).unwrap();
    assert_eq!(exec.redo(1), Some(8));
    assert_eq!(history(&exec), vec![1, 2, 8]);
}

#[test]
fn jump_to_shows_an_entry_without_losing_history() {
    let tick = ManualTick::new();
    let mut exec = identity(&tick).build().unwrap();
    for x in 1..=4 {
        exec.invoke(x).unwrap();
    }
    assert_eq!(exec.jump_to(1).unwrap(), Some(2));
    assert_eq!(history(&exec), vec![1, 2, 3, 4]);
    assert_eq!(exec.jump_to(9).unwrap(), Some(2));
}

#[test]
fn edits_out_of_range_are_noops() {
    let tick = ManualTick::new();
    let mut exec = identity(&tick).build().unwrap();
    exec.invoke(1).unwrap();
    assert_eq!(exec.replace_at(3, 5).unwrap(), Some(1));
    assert_eq!(exec.insert_at(3, 5).unwrap(), Some(1));
    assert_eq!(exec.remove_at(3).unwrap(), Some(1));
    assert_eq!(history(&exec), vec![1]);
}
