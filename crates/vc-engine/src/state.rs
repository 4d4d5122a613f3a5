//! Player state: stats, resources, inventory, flags and visit counts.
//!
//! A [`GameState`] is plain data. Engine operations never mutate a state they
//! were handed; they clone it, work on the copy and return the copy.

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::inventory::Inventory;
use crate::resource::Resource;
use crate::story::Story;

/// Version stamped into every state the engine creates.
pub const ENGINE_VERSION: &str = "1.1.0";

/// The only story schema version this engine accepts.
pub const STORY_SCHEMA_VERSION: u32 = 1;

/// Reserved flag holding the most recent equip failure message.
pub const LAST_EQUIP_ERROR_FLAG: &str = "__LAST_EQUIP_ERROR__";

/// The six fixed character stats. Stats are unbounded and may go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "UPPERCASE")]
pub struct Stats {
    /// Wisdom.
    pub wisdom: i64,
    /// Endurance.
    pub endurance: i64,
    /// Agility.
    pub agility: i64,
    /// Luck.
    pub luck: i64,
    /// Timing.
    pub timing: i64,
    /// Health. Distinct from any story-defined HP resource.
    pub health: i64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            wisdom: 1,
            endurance: 1,
            agility: 1,
            luck: 1,
            timing: 1,
            health: 10,
        }
    }
}

impl Stats {
    /// Stat keys as they appear in story documents, in display order.
    pub const KEYS: [&'static str; 6] = [
        "WISDOM",
        "ENDURANCE",
        "AGILITY",
        "LUCK",
        "TIMING",
        "HEALTH",
    ];

    /// Look up a stat by its document key.
    pub fn get(&self, key: &str) -> Option<i64> {
        match key {
            "WISDOM" => Some(self.wisdom),
            "ENDURANCE" => Some(self.endurance),
            "AGILITY" => Some(self.agility),
            "LUCK" => Some(self.luck),
            "TIMING" => Some(self.timing),
            "HEALTH" => Some(self.health),
            _ => None,
        }
    }

    /// Mutable access to a stat by its document key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut i64> {
        match key {
            "WISDOM" => Some(&mut self.wisdom),
            "ENDURANCE" => Some(&mut self.endurance),
            "AGILITY" => Some(&mut self.agility),
            "LUCK" => Some(&mut self.luck),
            "TIMING" => Some(&mut self.timing),
            "HEALTH" => Some(&mut self.health),
            _ => None,
        }
    }

    /// Iterate `(key, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        Self::KEYS
            .iter()
            .filter_map(move |&key| self.get(key).map(|value| (key, value)))
    }
}

/// A flag value.
///
/// Story-authored flags are booleans. The engine also stores equip failure
/// messages under [`LAST_EQUIP_ERROR_FLAG`] as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    /// A boolean flag.
    Bool(bool),
    /// A message-carrying flag.
    Text(String),
}

impl FlagValue {
    /// `true`, or a non-empty message.
    pub fn is_truthy(&self) -> bool {
        match self {
            FlagValue::Bool(b) => *b,
            FlagValue::Text(s) => !s.is_empty(),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

/// The player's state within one run of a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Engine version that created the state.
    pub engine_version: String,
    /// Story schema version the state was created against.
    pub schema_version: u32,
    /// Id of the originating story.
    pub story_id: String,
    /// Title of the originating story.
    pub story_title: String,
    /// Current node id.
    pub node_id: String,
    /// Character stats.
    #[serde(default)]
    pub stats: Stats,
    /// Story-defined resources keyed by resource key.
    #[serde(default)]
    pub resources: BTreeMap<String, Resource>,
    /// Equipment slots and item pools.
    #[serde(default)]
    pub inventory: Inventory,
    /// Open-vocabulary flags.
    #[serde(default)]
    pub flags: BTreeMap<String, FlagValue>,
    /// Departure counts per node id.
    #[serde(default)]
    pub visited: BTreeMap<String, u32>,
    /// When the run started.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// When the state last changed.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl GameState {
    /// A blank state positioned at the story's start node, with default
    /// stats and nothing else. Use
    /// [`create_new_game_state`](crate::engine::create_new_game_state) to also
    /// seed resources and the loadout.
    pub fn new(story: &Story) -> Self {
        let created = now();
        Self {
            engine_version: ENGINE_VERSION.to_string(),
            schema_version: STORY_SCHEMA_VERSION,
            story_id: story.meta.id.clone(),
            story_title: story.meta.title.clone(),
            node_id: story.start.clone(),
            stats: Stats::default(),
            resources: BTreeMap::new(),
            inventory: Inventory::default(),
            flags: BTreeMap::new(),
            visited: BTreeMap::new(),
            created_at: created,
            updated_at: created,
        }
    }

    /// Check whether a flag is set to a truthy value.
    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).is_some_and(FlagValue::is_truthy)
    }

    /// Set a boolean flag.
    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.flags.insert(key.into(), FlagValue::Bool(value));
    }

    /// The message left by the most recent failed equip, if any.
    pub fn last_equip_error(&self) -> Option<&str> {
        match self.flags.get(LAST_EQUIP_ERROR_FLAG) {
            Some(FlagValue::Text(message)) => Some(message.as_str()),
            _ => None,
        }
    }

    pub(crate) fn set_equip_error(&mut self, message: String) {
        self.flags
            .insert(LAST_EQUIP_ERROR_FLAG.to_string(), FlagValue::Text(message));
    }

    pub(crate) fn clear_equip_error(&mut self) {
        self.flags.remove(LAST_EQUIP_ERROR_FLAG);
    }

    /// Look up a resource by key.
    pub fn resource(&self, key: &str) -> Option<&Resource> {
        self.resources.get(key)
    }

    /// How many times the player has left a node.
    pub fn visits(&self, node_id: &str) -> u32 {
        self.visited.get(node_id).copied().unwrap_or(0)
    }

    /// Whether this state was created from the given story.
    pub fn is_for_story(&self, story: &Story) -> bool {
        self.story_id == story.meta.id
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = now();
    }
}

/// The current time at the millisecond precision saves are stored with.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
