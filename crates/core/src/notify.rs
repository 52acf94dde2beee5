// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber registry with coalesced delivery
//!
//! Any number of [`Notifier::notify`] calls between two scheduler turns
//! collapse into one fan-out. Delivery is never synchronous with the call
//! that caused it; it runs on the next turn of a [`TickScheduler`], or when
//! the owner calls [`Notifier::flush`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// A zero-argument change callback
pub type Subscriber = Arc<dyn Fn() + Send + Sync>;

/// Deferred unit of work
pub type Task = Box<dyn FnOnce() + Send>;

/// Handle for unsubscribing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

/// Runs deferred work on a later turn
pub trait TickScheduler: Send + Sync {
    /// Queue `task` for a later turn; `false` if there is no turn to queue on
    fn schedule(&self, task: Task) -> bool;
}

/// Defers to the next turn of the current tokio runtime
///
/// Outside a runtime the task is dropped and the fan-out stays pending until
/// [`Notifier::flush`] or a later `notify` from inside a runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTick;

impl TickScheduler for TokioTick {
    fn schedule(&self, task: Task) -> bool {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::task::yield_now().await;
                    task();
                });
                true
            }
            Err(_) => {
                tracing::trace!("no tokio runtime; notification parked until flush");
                false
            }
        }
    }
}

/// Queues deferred work until [`ManualTick::run_pending`] is called
#[derive(Clone, Default)]
pub struct ManualTick {
    queue: Arc<Mutex<Vec<Task>>>,
}

impl ManualTick {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run everything queued so far; returns the number of tasks run
    pub fn run_pending(&self) -> usize {
        let tasks: Vec<Task> = {
            let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *queue)
        };
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl TickScheduler for ManualTick {
    fn schedule(&self, task: Task) -> bool {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(task);
        true
    }
}

struct Registry {
    subscribers: RwLock<BTreeMap<SubscriberId, Subscriber>>,
    next_id: AtomicU64,
    pending: AtomicBool,
    /// Pending, but no scheduler turn will deliver it
    parked: AtomicBool,
    deliveries: AtomicU64,
}

impl Registry {
    fn flush(&self) -> bool {
        if !self.pending.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.parked.store(false, Ordering::SeqCst);
        let callbacks: Vec<Subscriber> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(subscribers = callbacks.len(), "delivering change notification");
        for callback in callbacks {
            callback();
        }
        true
    }
}

/// Per-instance subscriber registry
pub struct Notifier {
    registry: Arc<Registry>,
    scheduler: Arc<dyn TickScheduler>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .field("pending", &self.is_pending())
            .field("deliveries", &self.deliveries())
            .finish()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Arc::new(TokioTick))
    }
}

impl Notifier {
    pub fn new(scheduler: Arc<dyn TickScheduler>) -> Self {
        Self {
            registry: Arc::new(Registry {
                subscribers: RwLock::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
                pending: AtomicBool::new(false),
                parked: AtomicBool::new(false),
                deliveries: AtomicU64::new(0),
            }),
            scheduler,
        }
    }

    /// Fresh registry sharing this notifier's scheduler
    pub fn detached(&self) -> Self {
        Self::new(Arc::clone(&self.scheduler))
    }

    /// Register a callback
    ///
    /// Registering the same `Arc` twice returns the existing id.
    pub fn subscribe(&self, callback: Subscriber) -> SubscriberId {
        let mut subs = self
            .registry
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner());
        let target = Arc::as_ptr(&callback) as *const ();
        if let Some((id, _)) = subs
            .iter()
            .find(|(_, cb)| Arc::as_ptr(cb) as *const () == target)
        {
            return *id;
        }
        let id = SubscriberId(self.registry.next_id.fetch_add(1, Ordering::SeqCst));
        subs.insert(id, callback);
        id
    }

    /// Remove a callback; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.registry
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
            .is_some()
    }

    /// Request a fan-out on the next scheduler turn
    pub fn notify(&self) {
        let was_pending = self.registry.pending.swap(true, Ordering::SeqCst);
        if was_pending && !self.registry.parked.load(Ordering::SeqCst) {
            return;
        }
        let registry = Arc::clone(&self.registry);
        let scheduled = self.scheduler.schedule(Box::new(move || {
            registry.flush();
        }));
        self.registry.parked.store(!scheduled, Ordering::SeqCst);
    }

    /// Deliver a pending fan-out now; returns whether one was delivered
    ///
    /// A turn already scheduled for it finds nothing left to do.
    pub fn flush(&self) -> bool {
        self.registry.flush()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Whether a fan-out is scheduled but has not run yet
    pub fn is_pending(&self) -> bool {
        self.registry.pending.load(Ordering::SeqCst)
    }

    /// Number of fan-outs delivered so far
    pub fn deliveries(&self) -> u64 {
        self.registry.deliveries.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
