//! Typed story documents.
//!
//! A story is authored as JSON and decoded after it passes
//! [`validate_story`](crate::validate::validate_story). Decoding is strict
//! only where the validator checks shape (the node graph, slots, ids) and
//! tolerant everywhere else, so every document that validates also decodes.
//! See [`crate::lenient`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::effect::Effect;
use crate::error::{EngineError, EngineResult, EquipError};
use crate::inventory::Slot;
use crate::lenient;
use crate::requirement::Requirement;
use crate::validate::validate_story;

/// A complete branching story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Document schema version.
    #[serde(deserialize_with = "lenient::schema_version")]
    pub schema_version: u32,
    /// Identity and display metadata.
    pub meta: StoryMeta,
    /// Id of the node a new run starts at.
    pub start: String,
    /// All nodes keyed by id.
    pub nodes: BTreeMap<String, Node>,
    /// Item catalog. `None` means the story defines no catalog at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<BTreeMap<String, ItemDef>>,
    /// Resource defaults keyed by resource key.
    #[serde(
        default,
        deserialize_with = "lenient::lossy_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub resources: BTreeMap<String, ResourceDef>,
    /// Starting inventory, equipment and resource overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadout: Option<Loadout>,
}

/// Story identity and display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryMeta {
    /// Stable story id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Optional blurb for story pickers.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

/// A narrative beat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Narration shown to the player.
    pub text: String,
    /// Outgoing choices, in display order.
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub choices: Vec<Choice>,
}

/// An edge from one node to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Text shown to the player.
    pub text: String,
    /// Target node id.
    pub to: String,
    /// Gate that must pass for the choice to be taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require: Option<Requirement>,
    /// Effects applied, in order, when the choice is taken.
    #[serde(
        default,
        deserialize_with = "lenient::effect_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub effects: Vec<Effect>,
}

/// A catalog entry for an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDef {
    /// Display name.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    /// Slots the item may be equipped to. Empty means not equipable.
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub allowed_slots: Vec<Slot>,
    /// Effects applied when the item enters a slot.
    #[serde(
        default,
        deserialize_with = "lenient::effect_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub on_equip: Vec<Effect>,
    /// Effects applied when the item leaves a slot.
    #[serde(
        default,
        deserialize_with = "lenient::effect_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub on_unequip: Vec<Effect>,
}

impl ItemDef {
    /// Display name, falling back to the item id.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(id)
    }
}

/// Resource defaults, also used for loadout overrides.
///
/// Non-numeric `max`/`current` values and non-string labels are treated as
/// absent. An entry that is not an object decodes as all-absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDef {
    /// Display label. Defaults to the resource key.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub label: Option<String>,
    /// Maximum value.
    #[serde(
        default,
        deserialize_with = "lenient::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max: Option<i64>,
    /// Starting value. Defaults to `max`.
    #[serde(
        default,
        deserialize_with = "lenient::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub current: Option<i64>,
}

/// Starting inventory, equipment and resource overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    /// Item ids placed in the items pool.
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub items: Vec<String>,
    /// Consumable ids.
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub consumables: Vec<String>,
    /// Starting equipment per slot.
    #[serde(default, deserialize_with = "lenient::lossy")]
    pub equip: LoadoutEquip,
    /// Overrides for resources the story declares.
    #[serde(default, deserialize_with = "lenient::lossy_map")]
    pub resources: BTreeMap<String, ResourceDef>,
}

/// Starting equipment. Unknown slot keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutEquip {
    /// Weapon slot item id.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub weapon: Option<String>,
    /// Armor slot item id.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub armor: Option<String>,
    /// Special slot item id.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub special: Option<String>,
}

impl LoadoutEquip {
    /// The item granted for a slot, if any.
    pub fn get(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::Weapon => self.weapon.as_deref(),
            Slot::Armor => self.armor.as_deref(),
            Slot::Special => self.special.as_deref(),
        }
    }

    /// `(slot, item id)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &str)> + '_ {
        Slot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|id| (slot, id)))
    }
}

impl Story {
    /// Decode a story from an already-parsed JSON value.
    ///
    /// This does not run structural validation; see [`load_story`].
    pub fn from_value(value: Value) -> EngineResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up an item's catalog entry.
    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.as_ref().and_then(|catalog| catalog.get(id))
    }

    /// Whether the story carries an item catalog (possibly empty).
    pub fn has_catalog(&self) -> bool {
        self.items.is_some()
    }

    /// Check the catalog permits `id` in `slot`.
    ///
    /// Items without a catalog entry can never be equipped.
    pub fn check_slot(&self, id: &str, slot: Slot) -> Result<(), EquipError> {
        let def = self
            .item(id)
            .ok_or_else(|| EquipError::UnknownItem(id.to_string()))?;
        if def.allowed_slots.is_empty() {
            return Err(EquipError::NotEquipable(id.to_string()));
        }
        if !def.allowed_slots.contains(&slot) {
            return Err(EquipError::WrongSlot {
                id: id.to_string(),
                slot,
            });
        }
        Ok(())
    }
}

/// Parse, validate and decode a story document.
///
/// Fails with [`EngineError::InvalidStory`] carrying the full report when
/// validation finds any problem.
pub fn load_story(json: &str) -> EngineResult<Story> {
    let value: Value = serde_json::from_str(json)?;
    let report = validate_story(&value);
    if !report.ok {
        return Err(EngineError::InvalidStory(report));
    }
    Story::from_value(value)
}
