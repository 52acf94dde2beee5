// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rewind-core: history model for reactive values
//!
//! This crate provides:
//! - The entry model and value snapshot/equality helpers
//! - The recording policy (pause, throttling, duplicate suppression)
//! - An in-memory timeline with undo/redo
//! - Pure bulk transforms (sort, dedupe, merge, select) and queries
//! - JSON payload formats and TOML configuration
//! - A coalescing change notifier

pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod id;
pub mod notify;
pub mod payload;
pub mod policy;
pub mod query;
pub mod timeline;
pub mod transform;
pub mod value;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{HistoryConfig, DEFAULT_WINDOW};
pub use entry::Entry;
pub use error::{ConfigError, PayloadError};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use notify::{ManualTick, Notifier, Subscriber, SubscriberId, Task, TickScheduler, TokioTick};
pub use payload::{check_unique_indices, parse_entries, serialize_entries, StatePayload};
pub use policy::{
    Admission, DuplicatePolicy, GroupFn, MetadataFn, Recorder, RecorderSettings, Tagging,
};
pub use query::{filter_entries, HistoryQuery};
pub use timeline::Timeline;
pub use transform::{
    dedupe, merge_into, select, sort_entries, MergeOptions, MergePosition, MergeReport,
    SortOrder, SplitRange,
};
pub use value::{compare_values, snapshot, Equality, EqualityFn};
