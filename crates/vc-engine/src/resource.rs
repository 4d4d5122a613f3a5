//! Bounded resource pools (HP, Credits, Reputation, etc.).
//!
//! Unlike stats, a resource is clamped: every mutation keeps
//! `0 <= current <= max`, and `max` itself never drops below zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named numeric pool clamped between zero and its maximum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Display label.
    pub label: String,
    /// Current value.
    #[serde(default)]
    pub current: i64,
    /// Maximum value.
    #[serde(default)]
    pub max: i64,
}

impl Resource {
    /// Create a resource starting at its maximum value.
    pub fn new(label: impl Into<String>, max: i64) -> Self {
        Self::with_current(label, max, max)
    }

    /// Create a resource with an explicit starting value, clamped into range.
    pub fn with_current(label: impl Into<String>, current: i64, max: i64) -> Self {
        let mut resource = Self {
            label: label.into(),
            current,
            max,
        };
        resource.clamp();
        resource
    }

    /// Add a signed delta to the current value. Returns the new value.
    pub fn add(&mut self, delta: i64) -> i64 {
        self.current = self.current.saturating_add(delta);
        self.clamp();
        self.current
    }

    /// Assign the current value. Returns the value after clamping.
    pub fn set(&mut self, value: i64) -> i64 {
        self.current = value;
        self.clamp();
        self.current
    }

    /// Add a signed delta to the maximum, then re-clamp the current value.
    /// Returns the new maximum.
    pub fn add_max(&mut self, delta: i64) -> i64 {
        self.max = self.max.saturating_add(delta);
        self.clamp();
        self.max
    }

    /// Replace the maximum, then re-clamp the current value.
    pub fn set_max(&mut self, max: i64) {
        self.max = max;
        self.clamp();
    }

    /// Returns true if the pool is at zero.
    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    /// Returns true if the pool is at its maximum.
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    fn clamp(&mut self) {
        self.max = self.max.max(0);
        self.current = self.current.clamp(0, self.max);
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}/{}", self.label, self.current, self.max)
    }
}

/// Fetch a resource, creating an empty `0/0` bucket labelled with its key on
/// first reference.
pub fn ensure_resource<'a>(
    resources: &'a mut BTreeMap<String, Resource>,
    key: &str,
) -> &'a mut Resource {
    resources
        .entry(key.to_string())
        .or_insert_with(|| Resource::new(key, 0))
}
