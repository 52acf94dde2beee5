// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value snapshots, equality and ordering
//!
//! Stored snapshots never alias live values: every value that enters a
//! timeline goes through [`snapshot`], and every value handed back out is
//! cloned again by the engine.

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Custom equality used for duplicate suppression
pub type EqualityFn<V> = Arc<dyn Fn(&V, &V) -> bool + Send + Sync>;

/// Take an owned copy of a value for storage
pub fn snapshot<V: Clone>(value: &V) -> V {
    value.clone()
}

/// Equality check for duplicate suppression
///
/// Structural (`PartialEq`) unless a custom function is configured.
pub struct Equality<V> {
    custom: Option<EqualityFn<V>>,
}

impl<V> Equality<V> {
    pub fn structural() -> Self {
        Self { custom: None }
    }

    pub fn custom(f: EqualityFn<V>) -> Self {
        Self { custom: Some(f) }
    }

    /// Whether a caller-supplied function is in use
    pub fn is_custom(&self) -> bool {
        self.custom.is_some()
    }
}

impl<V: PartialEq> Equality<V> {
    pub fn same(&self, a: &V, b: &V) -> bool {
        match &self.custom {
            Some(f) => f(a, b),
            None => a == b,
        }
    }
}

impl<V> Clone for Equality<V> {
    fn clone(&self) -> Self {
        Self {
            custom: self.custom.clone(),
        }
    }
}

impl<V> Default for Equality<V> {
    fn default() -> Self {
        Self::structural()
    }
}

impl<V> fmt::Debug for Equality<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Equality")
            .field("custom", &self.is_custom())
            .finish()
    }
}

/// Order two values for `asc`/`desc` sorting
///
/// Two numbers compare numerically. Anything else compares by its
/// stringified form: string contents for strings, compact JSON otherwise.
pub fn compare_values<V: Serialize>(a: &V, b: &V) -> Ordering {
    let (a, b) = match (serde_json::to_value(a), serde_json::to_value(b)) {
        (Ok(a), Ok(b)) => (a, b),
        _ => return Ordering::Equal,
    };
    match (&a, &b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => stringify(&a).cmp(&stringify(&b)),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
