// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine instance ids
//!
//! An id only names an engine in log lines (the `executor` field). Split
//! peers draw from their parent's generator, so a shared sequence keeps
//! them apart.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub trait IdGen: Send + Sync {
    fn next(&self) -> String;
}

/// Random ids: a v4 UUID in its 32-digit form
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// `<prefix>-1`, `<prefix>-2`, ... from a counter shared by clones
#[derive(Debug, Clone)]
pub struct SequentialIdGen {
    prefix: Arc<str>,
    issued: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: Arc::from(prefix),
            issued: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{n}", self.prefix)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
