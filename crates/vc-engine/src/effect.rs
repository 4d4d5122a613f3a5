//! Effects that modify player state.
//!
//! Effects are tagged by `op` in story documents. Entries with an unknown
//! `op` or a malformed payload are dropped while decoding (see
//! [`crate::lenient::effect_list`]), so the interpreter only ever sees
//! well-formed effects.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inventory::{self, Slot};
use crate::resource::ensure_resource;
use crate::state::GameState;
use crate::story::Story;

/// How deeply item `onEquip`/`onUnequip` batches may nest.
pub const MAX_EFFECT_DEPTH: usize = 16;

/// A single state mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Effect {
    /// Add to a stat. Stats are unbounded.
    StatAdd {
        /// Stat key (e.g. `LUCK`).
        key: String,
        /// Signed delta.
        #[serde(default)]
        value: i64,
    },
    /// Set a boolean flag.
    FlagSet {
        /// Flag key.
        key: String,
        /// New value.
        #[serde(default)]
        value: bool,
    },
    /// Add an item to the items pool.
    GiveItem {
        /// Item id.
        id: String,
    },
    /// Add a consumable.
    GiveConsumable {
        /// Consumable id.
        id: String,
    },
    /// Remove one copy of a consumable, if held.
    ConsumeConsumable {
        /// Consumable id.
        id: String,
    },
    /// Equip an item from the pool.
    Equip {
        /// Target slot.
        slot: Slot,
        /// Item id.
        id: String,
    },
    /// Return a slot's item to the pool.
    Unequip {
        /// Slot to empty.
        slot: Slot,
    },
    /// Add to a resource's current value.
    ResourceAdd {
        /// Resource key.
        key: String,
        /// Signed delta.
        #[serde(default)]
        value: i64,
    },
    /// Assign a resource's current value.
    ResourceSet {
        /// Resource key.
        key: String,
        /// New value, clamped into range.
        #[serde(default)]
        value: i64,
    },
    /// Add to a resource's maximum.
    ResourceMaxAdd {
        /// Resource key.
        key: String,
        /// Signed delta.
        #[serde(default)]
        value: i64,
    },
}

impl Effect {
    /// Every `op` tag the interpreter understands.
    pub const OPS: [&'static str; 10] = [
        "statAdd",
        "flagSet",
        "giveItem",
        "giveConsumable",
        "consumeConsumable",
        "equip",
        "unequip",
        "resourceAdd",
        "resourceSet",
        "resourceMaxAdd",
    ];

    /// The document `op` tag for this effect.
    pub fn op(&self) -> &'static str {
        match self {
            Effect::StatAdd { .. } => "statAdd",
            Effect::FlagSet { .. } => "flagSet",
            Effect::GiveItem { .. } => "giveItem",
            Effect::GiveConsumable { .. } => "giveConsumable",
            Effect::ConsumeConsumable { .. } => "consumeConsumable",
            Effect::Equip { .. } => "equip",
            Effect::Unequip { .. } => "unequip",
            Effect::ResourceAdd { .. } => "resourceAdd",
            Effect::ResourceSet { .. } => "resourceSet",
            Effect::ResourceMaxAdd { .. } => "resourceMaxAdd",
        }
    }

    fn apply(&self, story: &Story, state: &mut GameState, depth: usize) {
        match self {
            Effect::StatAdd { key, value } => match state.stats.get_mut(key) {
                Some(stat) => *stat = stat.saturating_add(*value),
                None => debug!(key = %key, "statAdd on unknown stat ignored"),
            },
            Effect::FlagSet { key, value } => state.set_flag(key.clone(), *value),
            Effect::GiveItem { id } => state.inventory.items.push(id.clone()),
            Effect::GiveConsumable { id } => state.inventory.consumables.push(id.clone()),
            Effect::ConsumeConsumable { id } => {
                state.inventory.consume(id);
            }
            Effect::Equip { slot, id } => {
                match inventory::equip_from_pool(story, state, *slot, id, depth) {
                    Ok(()) => state.clear_equip_error(),
                    Err(err) => {
                        debug!(%slot, item = %id, error = %err, "equip refused");
                        state.set_equip_error(err.to_string());
                    }
                }
            }
            Effect::Unequip { slot } => inventory::unequip_to_pool(story, state, *slot, depth),
            Effect::ResourceAdd { key, value } => {
                ensure_resource(&mut state.resources, key).add(*value);
            }
            Effect::ResourceSet { key, value } => {
                ensure_resource(&mut state.resources, key).set(*value);
            }
            Effect::ResourceMaxAdd { key, value } => {
                ensure_resource(&mut state.resources, key).add_max(*value);
            }
        }
    }
}

/// Apply effects left to right to a copy of `state`.
///
/// A refused equip records its message under
/// [`LAST_EQUIP_ERROR_FLAG`](crate::state::LAST_EQUIP_ERROR_FLAG) and the
/// batch carries on; earlier effects are not rolled back.
pub fn apply_effects(story: &Story, state: &GameState, effects: &[Effect]) -> GameState {
    let mut next = state.clone();
    apply_in_place(story, &mut next, effects, 0);
    next.touch();
    next
}

/// Apply effects to a working draft. `depth` counts nested item batches.
pub(crate) fn apply_in_place(story: &Story, state: &mut GameState, effects: &[Effect], depth: usize) {
    for effect in effects {
        effect.apply(story, state, depth);
    }
}
