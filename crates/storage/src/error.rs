// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from the durable tier
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("checksum mismatch for entry {key}")]
    Corrupted { key: u64 },
    #[error("entry {key} not found in durable store")]
    Missing { key: u64 },
    #[error("injected failure: {0}")]
    Injected(String),
}
