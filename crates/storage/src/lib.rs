// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Storage tiers for history entries
//!
//! A [`FastWindow`] keeps the most recent entries in memory; a
//! [`DurableStore`] holds every entry keyed by insertion index.

mod dir;
mod error;
mod memory;
mod record;
mod store;
mod traced;
mod window;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use dir::JsonDirStore;
pub use error::StorageError;
pub use memory::MemoryStore;
pub use record::StoredRecord;
pub use store::DurableStore;
pub use traced::TracedStore;
pub use window::FastWindow;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStore, StoreCall};
