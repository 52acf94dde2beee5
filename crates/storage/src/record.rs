// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checksummed on-disk record
//!
//! Each record holds the entry as a JSON value plus a CRC32 of that value's
//! compact serialization. The checksum is verified on every read; a
//! mismatch is reported, never repaired.

use crate::error::StorageError;
use rewind_core::Entry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A single stored entry with its checksum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Insertion index of the entry
    pub key: u64,
    pub entry: serde_json::Value,
    /// CRC32 of the compact JSON form of `entry`
    pub checksum: u32,
}

impl StoredRecord {
    pub fn new<V: Serialize>(entry: &Entry<V>) -> Result<Self, StorageError> {
        let value = serde_json::to_value(entry)?;
        let checksum = Self::calculate_checksum(&value)?;
        Ok(Self {
            key: entry.key(),
            entry: value,
            checksum,
        })
    }

    fn calculate_checksum(value: &serde_json::Value) -> Result<u32, StorageError> {
        let json = serde_json::to_string(value)?;
        Ok(crc32fast::hash(json.as_bytes()))
    }

    /// Verify the checksum matches the entry
    pub fn verify(&self) -> bool {
        Self::calculate_checksum(&self.entry).is_ok_and(|c| c == self.checksum)
    }

    /// Verify, then decode the entry
    pub fn into_entry<V: DeserializeOwned>(self) -> Result<Entry<V>, StorageError> {
        if !self.verify() {
            return Err(StorageError::Corrupted { key: self.key });
        }
        Ok(serde_json::from_value(self.entry)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
