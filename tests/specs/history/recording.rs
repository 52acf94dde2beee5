//! Recording policy tests.
//!
//! Bound, duplicate suppression and throttling as seen from the public API.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn history_length_follows_the_bound() {
    for bound in [1usize, 3, 10] {
        let tick = ManualTick::new();
        let mut exec = identity(&tick)
            .call_now(0)
            .max_history(bound)
            .build()
            .unwrap();
        for x in 1..=7 {
            exec.invoke(x).unwrap();
        }
        assert_eq!(exec.len(), (7 + 1).min(bound));
        assert_eq!(exec.get_history().last().map(|e| e.value), Some(7));
    }
}

#[test]
fn no_duplicate_collapses_repeats() {
    let tick = ManualTick::new();
    let mut exec = identity(&tick).no_duplicate(true).build().unwrap();
    exec.invoke(4).unwrap();
    exec.invoke(4).unwrap();
    assert_eq!(history(&exec), vec![4]);
}

#[test]
fn history_step_keeps_every_third_result() {
    let tick = ManualTick::new();
    let mut exec = identity(&tick).history_step(3).build().unwrap();
    for x in 1..=9 {
        exec.invoke(x).unwrap();
    }
    assert_eq!(history(&exec), vec![3, 6, 9]);
}

#[test]
fn config_file_drives_recording() {
    let config = HistoryConfig::from_toml_str(
        r#"
        max_history = 2
        no_duplicate = true
        "#,
    )
    .unwrap();
    let tick = ManualTick::new();
    let mut exec = identity(&tick).config(config).build().unwrap();
    for x in [1, 2, 2, 3] {
        exec.invoke(x).unwrap();
    }
    assert_eq!(history(&exec), vec![2, 3]);
}

#[test]
fn failed_computation_records_nothing() {
    let tick = ManualTick::new();
    let mut exec = Executor::builder(|x: i64| {
        if x == 0 {
            Err("division by zero".into())
        } else {
            Ok(100 / x)
        }
    })
    .scheduler(Arc::new(tick.clone()))
    .build()
    .unwrap();
    exec.invoke(5).unwrap();
    assert!(exec.invoke(0).is_err());
    assert_eq!(history(&exec), vec![20]);
    assert_eq!(exec.value(), Some(20));
}
