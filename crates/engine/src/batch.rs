// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch bookkeeping shared by both engines

use crate::error::{BoxError, EngineError};
use crate::options::Profile;
use rewind_core::snapshot;

/// Open batch on an engine
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Batch {
    /// Computations that succeeded inside the batch
    pub invocations: usize,
}

/// Compute-only view of a two-tier engine during
/// [`TieredExecutor::batch`](crate::TieredExecutor::batch)
///
/// Invocations update the current value but record nothing and notify
/// nobody. The engine records the current value once when the batch closes,
/// even if nothing was invoked.
pub struct BatchScope<'a, A, V> {
    pub(crate) id: &'a str,
    pub(crate) profile: &'a Profile<A, V>,
    pub(crate) value: &'a mut Option<V>,
    pub(crate) initial: &'a mut Option<V>,
    pub(crate) batch: Batch,
}

impl<A, V: Clone> BatchScope<'_, A, V> {
    pub fn invoke(&mut self, args: A) -> Result<Option<V>, EngineError> {
        let result = (self.profile.callback)(args);
        self.settle(result)
    }

    pub fn settle(&mut self, result: Result<V, BoxError>) -> Result<Option<V>, EngineError> {
        match result {
            Ok(value) => {
                if self.initial.is_none() {
                    *self.initial = Some(snapshot(&value));
                }
                *self.value = Some(value);
                self.batch.invocations += 1;
            }
            Err(e) => self.profile.route(self.id, EngineError::Compute(e))?,
        }
        Ok(self.value.clone())
    }

    pub fn value(&self) -> Option<V> {
        self.value.clone()
    }
}
