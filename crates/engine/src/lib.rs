// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! History engines for reactive values
//!
//! - [`Executor`]: single-tier, in-memory timeline with a redo stack
//! - [`TieredExecutor`]: fast window in front of a durable store
//! - [`TieredHandle`]: serialized shared access to a tiered engine
//! - [`ExecutorGroup`]: joint control over several engines

mod batch;
mod bulk;
mod error;
mod executor;
mod group;
mod handle;
mod options;
mod persist;
mod tiered;

pub use batch::BatchScope;
pub use error::{BoxError, EngineError};
pub use executor::Executor;
pub use group::{ExecutorGroup, GroupMember};
pub use handle::TieredHandle;
pub use options::{Computation, ErrorHook, ExecutorBuilder, HistoryValue};
pub use tiered::TieredExecutor;
