// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! History configuration loaded from TOML.
//!
//! Every field is optional in the file; missing fields take the defaults
//! below.
//!
//! ```toml
//! store_history = true
//! max_history = 200
//! window = 1000
//! no_duplicate = false
//! history_step = 1
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default size of the fast window in the two-tier store
pub const DEFAULT_WINDOW: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Record values at all
    pub store_history: bool,
    /// Upper bound on live history entries; `None` is unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_history: Option<usize>,
    /// Entries held in the fast window of a two-tier store
    pub window: usize,
    /// Reject values equal to any existing entry
    pub no_duplicate: bool,
    /// Record every Nth accepted candidate
    pub history_step: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            store_history: true,
            max_history: None,
            window: DEFAULT_WINDOW,
            no_duplicate: false,
            history_step: 1,
        }
    }
}

impl HistoryConfig {
    /// Parse and validate TOML content
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: HistoryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_step == 0 {
            return Err(ConfigError::Invalid(
                "history_step must be at least 1".to_string(),
            ));
        }
        if self.window == 0 {
            return Err(ConfigError::Invalid("window must be at least 1".to_string()));
        }
        if self.max_history == Some(0) {
            return Err(ConfigError::Invalid(
                "max_history must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_max_history(mut self, max: usize) -> Self {
        self.max_history = Some(max);
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_history_step(mut self, step: u64) -> Self {
        self.history_step = step;
        self
    }

    pub fn with_no_duplicate(mut self, enabled: bool) -> Self {
        self.no_duplicate = enabled;
        self
    }

    pub fn with_store_history(mut self, enabled: bool) -> Self {
        self.store_history = enabled;
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
