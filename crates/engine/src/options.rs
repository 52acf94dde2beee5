// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine construction
//!
//! Data-only settings come from [`HistoryConfig`]; behavior (producers,
//! equality, error hook, eager call) is attached through the builder.

use crate::error::{BoxError, EngineError};
use rewind_core::{
    Clock, Equality, EqualityFn, GroupFn, HistoryConfig, IdGen, MetadataFn, RecorderSettings,
    SystemClock, Tagging, TickScheduler, TokioTick, UuidIdGen,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Bounds every recorded value type satisfies
pub trait HistoryValue:
    Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> HistoryValue for T where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// The wrapped computation
pub type Computation<A, V> = Arc<dyn Fn(A) -> Result<V, BoxError> + Send + Sync>;

/// Receives errors instead of the caller when configured
pub type ErrorHook = Arc<dyn Fn(&EngineError) + Send + Sync>;

/// Everything a peer engine needs to behave like its source
pub(crate) struct Profile<A, V> {
    pub callback: Computation<A, V>,
    pub config: HistoryConfig,
    pub settings: RecorderSettings<V>,
    pub on_error: Option<ErrorHook>,
    pub clock: Arc<dyn Clock>,
    pub id_gen: Arc<dyn IdGen>,
    pub scheduler: Arc<dyn TickScheduler>,
}

impl<A, V> Clone for Profile<A, V> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
            config: self.config.clone(),
            settings: self.settings.clone(),
            on_error: self.on_error.clone(),
            clock: Arc::clone(&self.clock),
            id_gen: Arc::clone(&self.id_gen),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl<A, V> Profile<A, V> {
    /// Hand an error to the hook if one is configured
    ///
    /// Returns `Ok(())` when the hook consumed it, so the caller can fall
    /// back to the unchanged current value.
    pub fn route(&self, id: &str, err: EngineError) -> Result<(), EngineError> {
        match &self.on_error {
            Some(hook) => {
                tracing::warn!(executor = id, kind = err.kind(), error = %err, "routed to error hook");
                hook(&err);
                Ok(())
            }
            None => Err(err),
        }
    }

    pub fn usage(&self, id: &str, operation: &'static str) -> Result<(), EngineError> {
        self.route(id, EngineError::HistoryDisabled { operation })
    }
}

/// Builder for [`Executor`](crate::Executor) and
/// [`TieredExecutor`](crate::TieredExecutor)
pub struct ExecutorBuilder<A, V> {
    callback: Computation<A, V>,
    config: HistoryConfig,
    metadata: Option<MetadataFn<V>>,
    group_by: Option<GroupFn<V>>,
    equality: Option<EqualityFn<V>>,
    on_error: Option<ErrorHook>,
    call_now: Option<A>,
    clock: Arc<dyn Clock>,
    id_gen: Arc<dyn IdGen>,
    scheduler: Arc<dyn TickScheduler>,
}

impl<A, V> ExecutorBuilder<A, V> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(A) -> Result<V, BoxError> + Send + Sync + 'static,
    {
        Self::from_computation(Arc::new(callback))
    }

    pub fn from_computation(callback: Computation<A, V>) -> Self {
        Self {
            callback,
            config: HistoryConfig::default(),
            metadata: None,
            group_by: None,
            equality: None,
            on_error: None,
            call_now: None,
            clock: Arc::new(SystemClock),
            id_gen: Arc::new(UuidIdGen),
            scheduler: Arc::new(TokioTick),
        }
    }

    pub fn config(mut self, config: HistoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store_history(mut self, enabled: bool) -> Self {
        self.config.store_history = enabled;
        self
    }

    pub fn max_history(mut self, max: usize) -> Self {
        self.config.max_history = Some(max);
        self
    }

    pub fn window(mut self, window: usize) -> Self {
        self.config.window = window;
        self
    }

    pub fn no_duplicate(mut self, enabled: bool) -> Self {
        self.config.no_duplicate = enabled;
        self
    }

    pub fn history_step(mut self, step: u64) -> Self {
        self.config.history_step = step;
        self
    }

    /// Attach a metadata producer, called with each recorded value
    pub fn metadata<F>(mut self, f: F) -> Self
    where
        F: Fn(&V) -> serde_json::Value + Send + Sync + 'static,
    {
        self.metadata = Some(Arc::new(f));
        self
    }

    /// Attach a group label producer, called with each recorded value
    pub fn group_by<F>(mut self, f: F) -> Self
    where
        F: Fn(&V) -> String + Send + Sync + 'static,
    {
        self.group_by = Some(Arc::new(f));
        self
    }

    /// Replace structural equality for duplicate suppression
    pub fn equality<F>(mut self, f: F) -> Self
    where
        F: Fn(&V, &V) -> bool + Send + Sync + 'static,
    {
        self.equality = Some(Arc::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&EngineError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Run the computation once at construction with these arguments
    pub fn call_now(mut self, args: A) -> Self {
        self.call_now = Some(args);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id_gen(mut self, id_gen: Arc<dyn IdGen>) -> Self {
        self.id_gen = id_gen;
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn TickScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Split into the reusable profile and the eager-call arguments
    pub(crate) fn into_profile(self) -> (Profile<A, V>, Option<A>) {
        let equality = match self.equality {
            Some(f) => Equality::custom(f),
            None => Equality::structural(),
        };
        let settings = RecorderSettings {
            store_history: self.config.store_history,
            no_duplicate: self.config.no_duplicate,
            history_step: self.config.history_step.max(1),
            equality,
            tagging: Tagging {
                metadata: self.metadata,
                group_by: self.group_by,
            },
        };
        let profile = Profile {
            callback: self.callback,
            config: self.config,
            settings,
            on_error: self.on_error,
            clock: self.clock,
            id_gen: self.id_gen,
            scheduler: self.scheduler,
        };
        (profile, self.call_now)
    }
}

impl<A, V> Profile<A, V> {
    /// Run the eager call, routing a failure to the hook
    pub fn seed(&self, id: &str, args: Option<A>) -> Result<Option<V>, EngineError> {
        let Some(args) = args else {
            return Ok(None);
        };
        match (self.callback)(args) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                self.route(id, EngineError::Compute(e))?;
                Ok(None)
            }
        }
    }
}
