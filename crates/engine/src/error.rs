// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the history engines

use rewind_core::PayloadError;
use rewind_storage::StorageError;
use thiserror::Error;

/// Error type returned by wrapped computations
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{operation} requires history to be enabled")]
    HistoryDisabled { operation: &'static str },
    #[error("computation failed: {0}")]
    Compute(#[source] BoxError),
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Payload(PayloadError::Json(e))
    }
}

impl EngineError {
    /// Short label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::HistoryDisabled { .. } => "usage",
            EngineError::Compute(_) => "compute",
            EngineError::Payload(_) => "payload",
            EngineError::Storage(_) => "storage",
            EngineError::Io { .. } => "io",
        }
    }
}
