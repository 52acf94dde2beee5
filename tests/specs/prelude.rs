//! Shared helpers for the behavior tests.

pub use rewind_core::{Entry, FakeClock, HistoryConfig, ManualTick, SequentialIdGen, SortOrder};
pub use rewind_engine::{Executor, ExecutorBuilder};
pub use rewind_storage::MemoryStore;
pub use std::sync::atomic::{AtomicUsize, Ordering};
pub use std::sync::Arc;

/// Identity engine with deterministic clock, ids and notification delivery
pub fn identity(tick: &ManualTick) -> ExecutorBuilder<i64, i64> {
    Executor::builder(|x: i64| Ok(x))
        .clock(Arc::new(FakeClock::new()))
        .id_gen(Arc::new(SequentialIdGen::new("doc")))
        .scheduler(Arc::new(tick.clone()))
}

pub fn values(entries: &[Entry<i64>]) -> Vec<i64> {
    entries.iter().map(|e| e.value).collect()
}

pub fn history(exec: &Executor<i64, i64>) -> Vec<i64> {
    values(&exec.get_history())
}

/// Counter incremented by every subscriber delivery
pub fn counter(exec: &Executor<i64, i64>) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    exec.subscribe(Arc::new(move || {
        c.fetch_add(1, Ordering::SeqCst);
    }));
    count
}
