// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for history payloads

use thiserror::Error;

/// Errors from parsing or validating serialized history
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate entry index {index} in payload")]
    DuplicateIndex { index: u64 },
    #[error("invalid payload: {0}")]
    Invalid(String),
}

/// Errors from loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML syntax error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}
