// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rewind_core::{FakeClock, ManualTick, SequentialIdGen};
use rewind_storage::{FakeStore, JsonDirStore, MemoryStore, StoreCall};
use std::sync::atomic::{AtomicUsize, Ordering};

fn builder(window: usize) -> ExecutorBuilder<i64, i64> {
    Executor::builder(|x: i64| Ok(x))
        .window(window)
        .clock(Arc::new(FakeClock::new()))
        .id_gen(Arc::new(SequentialIdGen::new("tiered")))
        .scheduler(Arc::new(ManualTick::new()))
}

async fn with_values<S: DurableStore<i64>>(
    builder: ExecutorBuilder<i64, i64>,
    store: S,
    xs: &[i64],
) -> TieredExecutor<i64, i64, S> {
    let mut exec = builder.build_tiered(store).await.unwrap();
    for &x in xs {
        exec.invoke(x).await.unwrap();
    }
    exec
}

async fn history<S: DurableStore<i64>>(exec: &TieredExecutor<i64, i64, S>) -> Vec<i64> {
    exec.get_history()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.value)
        .collect()
}

// =============================================================================
// Write-through and window
// =============================================================================

#[tokio::test]
async fn records_write_through_to_both_tiers() {
    let store = MemoryStore::new();
    let exec = with_values(builder(2), store.clone(), &[1, 2, 3, 4]).await;

    assert_eq!(store.len().await.unwrap(), 4);
    assert_eq!(exec.window().keys(), vec![2, 3]);
    assert_eq!(history(&exec).await, vec![1, 2, 3, 4]);
    assert_eq!(exec.len(), 4);
    assert_eq!(exec.value(), Some(4));
}

#[tokio::test]
async fn jump_to_evicted_entry_reads_durable_store() {
    let store = FakeStore::new();
    let mut exec = with_values(builder(2), store.clone(), &[1, 2, 3, 4]).await;
    store.clear_calls();

    assert_eq!(exec.jump_to(0).await.unwrap(), Some(1));
    assert_eq!(store.get_count(), 1);
    assert_eq!(exec.cursor(), Some(0));

    assert_eq!(exec.jump_to(3).await.unwrap(), Some(4));
    assert_eq!(store.get_count(), 1);
}

#[tokio::test]
async fn jump_to_out_of_range_is_noop() {
    let mut exec = with_values(builder(2), MemoryStore::new(), &[1, 2]).await;
    assert_eq!(exec.jump_to(5).await.unwrap(), Some(2));
    assert_eq!(exec.cursor(), Some(1));
}

#[tokio::test]
async fn undo_and_redo_cross_the_window() {
    let mut exec = with_values(builder(1), MemoryStore::new(), &[1, 2, 3, 4]).await;

    assert_eq!(exec.undo(3).await.unwrap(), Some(1));
    assert_eq!(exec.len(), 1);
    let redo: Vec<i64> = exec
        .redo_stack()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.value)
        .collect();
    assert_eq!(redo, vec![4, 3, 2]);

    assert_eq!(exec.undo(1).await.unwrap(), Some(1));
    assert_eq!(exec.redo(2).await.unwrap(), Some(3));
    assert_eq!(history(&exec).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn record_after_undo_deletes_redo_from_both_tiers() {
    let store = FakeStore::new();
    let mut exec = with_values(builder(5), store.clone(), &[1, 2, 3]).await;
    exec.undo(2).await.unwrap();
    store.clear_calls();

    exec.invoke(9).await.unwrap();
    assert!(store.calls().contains(&StoreCall::Remove(vec![1, 2])));
    assert_eq!(store.len().await.unwrap(), 2);
    assert_eq!(exec.window().keys(), vec![0, 3]);
    assert_eq!(history(&exec).await, vec![1, 9]);
    assert!(exec.redo_stack().await.unwrap().is_empty());
}

#[tokio::test]
async fn no_duplicate_scans_evicted_entries() {
    let mut exec = with_values(
        builder(1).no_duplicate(true),
        MemoryStore::new(),
        &[1, 2, 1],
    )
    .await;
    assert_eq!(history(&exec).await, vec![1, 2]);
    assert_eq!(exec.value(), Some(1));

    exec.invoke(3).await.unwrap();
    assert_eq!(history(&exec).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn custom_equality_compares_with_latest_entry() {
    let b = builder(1).equality(|a: &i64, b: &i64| a / 10 == b / 10);
    let exec = with_values(b, MemoryStore::new(), &[11, 12, 25]).await;
    assert_eq!(history(&exec).await, vec![11, 25]);
}

#[tokio::test]
async fn history_step_applies_to_tiered_recording() {
    let exec = with_values(builder(2).history_step(2), MemoryStore::new(), &[1, 2, 3, 4]).await;
    assert_eq!(history(&exec).await, vec![2, 4]);
}

// =============================================================================
// Storage failures
// =============================================================================

#[tokio::test]
async fn storage_failure_propagates_but_value_updates() {
    let store = FakeStore::new();
    let mut exec = with_values(builder(2), store.clone(), &[1]).await;
    store.fail_next("disk full");

    let err = exec.invoke(2).await.unwrap_err();
    assert!(matches!(err, EngineError::Storage(_)));
    assert_eq!(exec.value(), Some(2));
    assert_eq!(exec.len(), 1);
    assert_eq!(history(&exec).await, vec![1]);
}

#[tokio::test]
async fn storage_failure_routes_to_hook() {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let b = builder(2).on_error(move |e| {
        assert_eq!(e.kind(), "storage");
        h.fetch_add(1, Ordering::SeqCst);
    });
    let store = FakeStore::new();
    let mut exec = with_values(b, store.clone(), &[1]).await;
    store.fail_next("disk full");

    assert_eq!(exec.invoke(2).await.unwrap(), Some(2));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_read_leaves_position_unchanged() {
    let store = FakeStore::new();
    let mut exec = with_values(builder(1), store.clone(), &[1, 2, 3]).await;
    store.fail_next("read error");

    assert!(exec.undo(2).await.is_err());
    assert_eq!(exec.len(), 3);
    assert_eq!(exec.value(), Some(3));
}

// =============================================================================
// Direct edits and lifecycle
// =============================================================================

#[tokio::test]
async fn replace_at_rewrites_both_tiers() {
    let store = MemoryStore::new();
    let mut exec = with_values(builder(1), store.clone(), &[1, 2]).await;

    assert_eq!(exec.replace_at(0, 10).await.unwrap(), Some(2));
    assert_eq!(store.get(0).await.unwrap().map(|e| e.value), Some(10));

    assert_eq!(exec.replace_at(1, 20).await.unwrap(), Some(20));
    assert_eq!(exec.window().get(1).map(|e| e.value), Some(20));
    assert_eq!(history(&exec).await, vec![10, 20]);
}

#[tokio::test]
async fn remove_at_drops_entry_everywhere() {
    let store = MemoryStore::new();
    let mut exec = with_values(builder(5), store.clone(), &[1, 2, 3]).await;

    assert_eq!(exec.remove_at(2).await.unwrap(), Some(2));
    assert_eq!(store.len().await.unwrap(), 2);
    assert!(!exec.window().contains(2));

    exec.remove_at(0).await.unwrap();
    assert_eq!(exec.remove_at(0).await.unwrap(), Some(1));
    assert!(exec.is_empty());
}

#[tokio::test]
async fn positional_ops_require_history() {
    let mut exec = with_values(builder(2).store_history(false), MemoryStore::new(), &[1]).await;
    assert!(matches!(
        exec.jump_to(0).await,
        Err(EngineError::HistoryDisabled { operation: "jump_to" })
    ));
    assert!(matches!(
        exec.remove_at(0).await,
        Err(EngineError::HistoryDisabled { operation: "remove_at" })
    ));
    assert_eq!(exec.undo(1).await.unwrap(), Some(1));
}

#[tokio::test]
async fn reset_reseeds_both_tiers() {
    let store = MemoryStore::new();
    let mut exec = with_values(builder(2).call_now(0), store.clone(), &[1, 2, 3]).await;
    exec.undo(1).await.unwrap();

    assert_eq!(exec.reset().await.unwrap(), Some(0));
    assert_eq!(history(&exec).await, vec![0]);
    assert_eq!(store.len().await.unwrap(), 1);
    assert!(exec.redo_stack().await.unwrap().is_empty());
}

#[tokio::test]
async fn clear_history_keeps_current_value() {
    let store = MemoryStore::new();
    let mut exec = with_values(builder(2), store.clone(), &[1, 2, 3]).await;
    exec.undo(1).await.unwrap();

    assert_eq!(exec.clear_history().await.unwrap(), Some(2));
    assert_eq!(history(&exec).await, vec![2]);
    assert_eq!(store.len().await.unwrap(), 1);
}

#[tokio::test]
async fn reopening_a_store_restores_history() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = JsonDirStore::open(dir.path()).await.unwrap();
        with_values(builder(1), store, &[1, 2, 3]).await;
    }

    let store = JsonDirStore::open(dir.path()).await.unwrap();
    let mut exec = builder(1).build_tiered(store).await.unwrap();
    assert_eq!(history(&exec).await, vec![1, 2, 3]);
    assert_eq!(exec.value(), Some(3));
    assert_eq!(exec.initial_value(), Some(1));

    exec.invoke(4).await.unwrap();
    let last = exec.get_history().await.unwrap().pop().unwrap();
    assert_eq!(last.index, Some(3));
}

// =============================================================================
// Batch, pause and notification
// =============================================================================

#[tokio::test]
async fn batch_records_once_and_notifies_once() {
    let tick = ManualTick::new();
    let mut exec = builder(2)
        .scheduler(Arc::new(tick.clone()))
        .build_tiered(MemoryStore::new())
        .await
        .unwrap();
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    exec.subscribe(Arc::new(move || {
        c.fetch_add(1, Ordering::SeqCst);
    }));

    let out = exec
        .batch(|scope| {
            scope.invoke(1).unwrap();
            scope.invoke(2).unwrap();
            scope.value()
        })
        .await
        .unwrap();
    assert_eq!(out, Some(2));
    assert_eq!(history(&exec).await, vec![2]);
    assert_eq!(exec.initial_value(), Some(1));

    tick.run_pending();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_batch_records_current_value() {
    let store = MemoryStore::new();
    let mut exec = with_values(builder(2), store.clone(), &[1]).await;
    exec.batch(|_| ()).await.unwrap();
    assert_eq!(history(&exec).await, vec![1, 1]);
    assert_eq!(store.len().await.unwrap(), 2);
}

#[tokio::test]
async fn paused_engine_records_nothing() {
    let tick = ManualTick::new();
    let mut exec = builder(2)
        .scheduler(Arc::new(tick.clone()))
        .build_tiered(MemoryStore::new())
        .await
        .unwrap();
    exec.pause_history();
    exec.invoke(1).await.unwrap();
    assert!(exec.is_empty());
    assert_eq!(tick.run_pending(), 0);

    exec.resume_history();
    assert_eq!(tick.run_pending(), 1);
}

// =============================================================================
// Serialization
// =============================================================================

#[tokio::test]
async fn export_matches_single_tier_layout() {
    let mut tiered = with_values(builder(1), MemoryStore::new(), &[1, 2, 3]).await;
    tiered.undo(1).await.unwrap();
    let json = tiered.export_history().await.unwrap();

    let mut single = builder(1).build().unwrap();
    single.import_history(&json).unwrap();
    assert_eq!(single.export_state(), tiered.export_state().await.unwrap());

    let converted = tiered.to_single_tier().await.unwrap();
    assert_eq!(converted.export_state(), single.export_state());
}

#[tokio::test]
async fn import_replaces_both_tiers() {
    let source = with_values(builder(5), MemoryStore::new(), &[7, 8, 9]).await;
    let json = source.export_history().await.unwrap();

    let store = MemoryStore::new();
    let mut target = with_values(builder(2), store.clone(), &[1]).await;
    assert_eq!(target.import_history(&json).await.unwrap(), Some(9));
    assert_eq!(history(&target).await, vec![7, 8, 9]);
    assert_eq!(store.len().await.unwrap(), 3);
    assert_eq!(target.window().keys(), vec![1, 2]);
}

#[tokio::test]
async fn invalid_import_leaves_state_untouched() {
    let store = MemoryStore::new();
    let mut exec = with_values(builder(2), store.clone(), &[1, 2]).await;
    let json = r#"{"value":3,"history":[{"value":3,"_index":0},{"value":4,"_index":0}]}"#;

    assert!(exec.import_history(json).await.is_err());
    assert_eq!(history(&exec).await, vec![1, 2]);
    assert_eq!(exec.value(), Some(2));
    assert_eq!(store.len().await.unwrap(), 2);
}

#[tokio::test]
async fn failed_import_write_keeps_previous_state() {
    let store = FakeStore::new();
    let mut exec = with_values(builder(2), store.clone(), &[1, 2, 3]).await;
    let initial = exec.initial_value();
    let json = r#"{"value":20,"initialValue":10,"history":[{"value":10},{"value":20}]}"#;
    // first put lands, second fails
    store.fail_after(1, "disk full");

    let err = exec.import_history(json).await.unwrap_err();
    assert!(matches!(err, EngineError::Storage(_)));
    assert_eq!(exec.value(), Some(3));
    assert_eq!(exec.initial_value(), initial);
    assert_eq!(history(&exec).await, vec![1, 2, 3]);
    assert_eq!(exec.window().keys(), vec![1, 2]);
    assert_eq!(store.len().await.unwrap(), 3);
}

#[tokio::test]
async fn failed_import_restores_overwritten_entries() {
    let store = FakeStore::new();
    let mut exec = with_values(builder(2), store.clone(), &[1, 2, 3]).await;
    let json = r#"{"value":20,"history":[{"value":10,"_index":0},{"value":20,"_index":5}]}"#;
    // key 0 is evicted from the window: one read, one put, then the failure
    store.fail_after(2, "disk full");

    assert!(exec.import_history(json).await.is_err());
    assert_eq!(store.get(0).await.unwrap().map(|e| e.value), Some(1));
    assert_eq!(store.get(5).await.unwrap(), None);
    assert_eq!(history(&exec).await, vec![1, 2, 3]);
    assert_eq!(exec.value(), Some(3));
}

#[tokio::test]
async fn import_drops_stale_keys_after_writing() {
    let store = FakeStore::new();
    let mut exec = with_values(builder(2), store.clone(), &[1, 2]).await;
    store.clear_calls();

    exec.import_history(r#"{"value":9,"history":[{"value":9,"_index":7}]}"#)
        .await
        .unwrap();
    let calls = store.calls();
    let put = calls.iter().position(|c| *c == StoreCall::Put(7));
    let remove = calls.iter().position(|c| *c == StoreCall::Remove(vec![0, 1]));
    assert!(put.is_some() && remove.is_some() && put < remove, "{calls:?}");
    assert_eq!(store.len().await.unwrap(), 1);
}

#[tokio::test]
async fn deserialize_history_clears_redo() {
    let mut exec = with_values(builder(2), MemoryStore::new(), &[1, 2, 3]).await;
    exec.undo(1).await.unwrap();

    let value = exec
        .deserialize_history(r#"[{"value":5},{"value":6}]"#)
        .await
        .unwrap();
    assert_eq!(value, Some(6));
    assert_eq!(history(&exec).await, vec![5, 6]);
    assert!(exec.redo_stack().await.unwrap().is_empty());
}

#[tokio::test]
async fn serialized_history_round_trips() {
    let source = with_values(builder(1), MemoryStore::new(), &[1, 2]).await;
    let json = source.serialize_history().await.unwrap();

    let mut target = builder(1).build_tiered(MemoryStore::new()).await.unwrap();
    target.deserialize_history(&json).await.unwrap();
    assert_eq!(
        target.get_history().await.unwrap(),
        source.get_history().await.unwrap()
    );
}

#[tokio::test]
async fn save_and_load_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let source = with_values(builder(2), MemoryStore::new(), &[1, 2, 3]).await;
    source.save_state(&path).await.unwrap();

    let mut target = builder(2).build_tiered(MemoryStore::new()).await.unwrap();
    assert_eq!(target.load_state(&path).await.unwrap(), Some(3));
    assert_eq!(history(&target).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn query_history_reads_durable_tier() {
    let b = builder(1).group_by(|v: &i64| if v % 2 == 0 { "even" } else { "odd" }.to_string());
    let exec = with_values(b, MemoryStore::new(), &[1, 2, 3, 4]).await;
    let even: Vec<i64> = exec
        .query_history(&HistoryQuery::new().group("even"))
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.value)
        .collect();
    assert_eq!(even, vec![2, 4]);
}
