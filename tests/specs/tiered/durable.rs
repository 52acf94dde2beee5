//! Two-tier engine tests.
//!
//! The fast window forgets; the durable store does not.

use crate::prelude::*;
use similar_asserts::assert_eq;
use rewind_engine::TieredHandle;
use rewind_storage::{DurableStore, JsonDirStore};

#[tokio::test]
async fn evicted_entries_stay_reachable() {
    let store = MemoryStore::new();
    let mut exec = Executor::builder(|x: i64| Ok(x))
        .window(2)
        .build_tiered(store.clone())
        .await
        .unwrap();
    for x in 1..=6 {
        exec.invoke(x).await.unwrap();
    }
    assert_eq!(exec.window().len(), 2);
    assert_eq!(values(&exec.get_history().await.unwrap()), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(exec.jump_to(0).await.unwrap(), Some(1));
    assert_eq!(store.len().await.unwrap(), 6);
}

#[tokio::test]
async fn directory_store_outlives_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = JsonDirStore::open(dir.path()).await.unwrap();
        let mut exec = Executor::builder(|x: i64| Ok(x * 2))
            .window(1)
            .build_tiered(store)
            .await
            .unwrap();
        for x in 1..=3 {
            exec.invoke(x).await.unwrap();
        }
        exec.undo(1).await.unwrap();
        exec.invoke(10).await.unwrap();
    }

    let store = JsonDirStore::open(dir.path()).await.unwrap();
    let exec = Executor::builder(|x: i64| Ok(x * 2))
        .window(1)
        .build_tiered(store)
        .await
        .unwrap();
    assert_eq!(values(&exec.get_history().await.unwrap()), vec![2, 4, 20]);
    assert_eq!(exec.value(), Some(20));
}

#[tokio::test]
async fn handle_serializes_concurrent_callers() {
    let exec = Executor::builder(|x: i64| Ok(x))
        .window(3)
        .build_tiered(MemoryStore::new())
        .await
        .unwrap();
    let handle = TieredHandle::new(exec);
    for x in 1..=5 {
        handle.invoke(x).await.unwrap();
    }

    let (a, b) = tokio::join!(handle.undo(2), handle.undo(1));
    a.unwrap();
    b.unwrap();
    assert_eq!(handle.value().await, Some(2));
    assert_eq!(handle.get_history().await.unwrap().len(), 2);
}
