//! Batch and notification tests.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn batch_yields_one_entry_and_one_notification() {
    let tick = ManualTick::new();
    let mut exec = identity(&tick).build().unwrap();
    let count = counter(&exec);

    exec.batch(|e| {
        e.invoke(1).unwrap();
        e.invoke(2).unwrap();
        e.invoke(3).unwrap();
    });
    tick.run_pending();

    assert_eq!(history(&exec), vec![3]);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn notifications_are_never_synchronous() {
    let tick = ManualTick::new();
    let mut exec = identity(&tick).build().unwrap();
    let count = counter(&exec);

    exec.invoke(1).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);
    tick.run_pending();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn default_scheduler_outside_runtime_waits_for_flush() {
    let mut exec = Executor::builder(|x: i64| Ok(x)).build().unwrap();
    let count = counter(&exec);

    for x in 1..=3 {
        exec.invoke(x).unwrap();
    }
    assert_eq!(count.load(Ordering::SeqCst), 0);
    exec.flush_notifications();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn empty_batch_still_records_one_entry() {
    let tick = ManualTick::new();
    let mut exec = identity(&tick).build().unwrap();
    exec.invoke(4).unwrap();
    exec.batch(|_| {});
    assert_eq!(history(&exec), vec![4, 4]);
}

#[tokio::test]
async fn default_scheduler_delivers_on_next_tick() {
    let mut exec = Executor::builder(|x: i64| Ok(x)).build().unwrap();
    let count = counter(&exec);

    exec.invoke(1).unwrap();
    exec.invoke(2).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);

    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
