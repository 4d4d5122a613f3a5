//! Choice requirements and availability.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::state::GameState;
use crate::story::Choice;

/// A read-only predicate over player state gating a choice.
///
/// Every listed sub-predicate must pass. Keys within a map are checked in
/// sorted order. Entries of the wrong shape are dropped while decoding, so
/// any `require` object loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    /// Minimum stat values.
    #[serde(
        default,
        deserialize_with = "lenient::min_thresholds",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub stat_gte: BTreeMap<String, i64>,
    /// Minimum resource values.
    #[serde(
        default,
        deserialize_with = "lenient::min_thresholds",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub resource_gte: BTreeMap<String, i64>,
    /// Maximum resource values.
    #[serde(
        default,
        deserialize_with = "lenient::max_thresholds",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub resource_lte: BTreeMap<String, i64>,
    /// Flags that must be truthy.
    #[serde(
        default,
        deserialize_with = "lenient::string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub has_flag: Vec<String>,
    /// Items that must be owned (equipped, pooled, or consumable).
    #[serde(
        default,
        deserialize_with = "lenient::string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub has_item: Vec<String>,
    /// Consumables that must be held.
    #[serde(
        default,
        deserialize_with = "lenient::string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub has_consumable: Vec<String>,
}

/// Whether a choice may be taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// The choice may be taken.
    Available,
    /// The choice is locked.
    Blocked {
        /// Player-facing explanation.
        reason: String,
    },
}

impl Availability {
    /// Returns true if the choice may be taken.
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    /// The block reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Availability::Available => None,
            Availability::Blocked { reason } => Some(reason),
        }
    }

    fn blocked(reason: String) -> Self {
        Availability::Blocked { reason }
    }
}

impl Requirement {
    /// Evaluate against a state. The first failing check wins, in the order
    /// stats, resource minimums, resource maximums, flags, items,
    /// consumables.
    pub fn check(&self, state: &GameState) -> Availability {
        for (key, &min) in &self.stat_gte {
            if state.stats.get(key).unwrap_or(0) < min {
                return Availability::blocked(format!("Requires {key} ≥ {min}"));
            }
        }

        for (key, &min) in &self.resource_gte {
            if resource_current(state, key) < min {
                let label = resource_label(state, key);
                return Availability::blocked(format!("Requires {label} ≥ {min}"));
            }
        }

        for (key, &max) in &self.resource_lte {
            if resource_current(state, key) > max {
                let label = resource_label(state, key);
                return Availability::blocked(format!("Requires {label} ≤ {max}"));
            }
        }

        if let Some(flag) = self.has_flag.iter().find(|f| !state.flag(f)) {
            return Availability::blocked(format!("Requires flag: {flag}"));
        }

        if let Some(item) = self.has_item.iter().find(|i| !state.inventory.owns(i)) {
            return Availability::blocked(format!("Requires item: {item}"));
        }

        if let Some(id) = self
            .has_consumable
            .iter()
            .find(|c| !state.inventory.has_consumable(c))
        {
            return Availability::blocked(format!("Requires consumable: {id}"));
        }

        Availability::Available
    }
}

fn resource_current(state: &GameState, key: &str) -> i64 {
    state.resource(key).map_or(0, |r| r.current)
}

fn resource_label<'a>(state: &'a GameState, key: &'a str) -> &'a str {
    state.resource(key).map_or(key, |r| r.label.as_str())
}

/// Check whether a choice can currently be taken. A choice without a
/// `require` block is always available.
pub fn is_choice_available(state: &GameState, choice: &Choice) -> Availability {
    match &choice.require {
        Some(requirement) => requirement.check(state),
        None => Availability::Available,
    }
}
