//! Equipment slots, the items pool and consumables.
//!
//! Items move between the pool and the three slots. Catalog legality is
//! checked through [`Story::check_slot`], and item `onEquip`/`onUnequip`
//! effects run through the effect interpreter as nested batches.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::effect::{self, MAX_EFFECT_DEPTH};
use crate::error::EquipError;
use crate::state::GameState;
use crate::story::Story;

/// One of the three fixed equipment positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// Weapon slot.
    Weapon,
    /// Armor slot.
    Armor,
    /// Special slot.
    Special,
}

impl Slot {
    /// All slots in display order.
    pub const ALL: [Slot; 3] = [Slot::Weapon, Slot::Armor, Slot::Special];

    /// The slot's document key.
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Weapon => "weapon",
            Slot::Armor => "armor",
            Slot::Special => "special",
        }
    }

    /// Parse a document key.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.as_str() == s)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The player's gear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Equipped weapon.
    #[serde(default)]
    pub weapon: Option<String>,
    /// Equipped armor.
    #[serde(default)]
    pub armor: Option<String>,
    /// Equipped special item.
    #[serde(default)]
    pub special: Option<String>,
    /// Consumables. Order is kept and duplicates are allowed.
    #[serde(default)]
    pub consumables: Vec<String>,
    /// Equip-eligible items not currently worn. Duplicates are allowed.
    #[serde(default)]
    pub items: Vec<String>,
}

impl Inventory {
    /// The item in a slot, if any.
    pub fn slot(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::Weapon => self.weapon.as_deref(),
            Slot::Armor => self.armor.as_deref(),
            Slot::Special => self.special.as_deref(),
        }
    }

    /// Mutable access to a slot.
    pub fn slot_mut(&mut self, slot: Slot) -> &mut Option<String> {
        match slot {
            Slot::Weapon => &mut self.weapon,
            Slot::Armor => &mut self.armor,
            Slot::Special => &mut self.special,
        }
    }

    /// Every id the player owns: equipped items, the pool and consumables.
    pub fn owned_ids(&self) -> impl Iterator<Item = &str> + '_ {
        Slot::ALL
            .into_iter()
            .filter_map(|slot| self.slot(slot))
            .chain(self.items.iter().map(String::as_str))
            .chain(self.consumables.iter().map(String::as_str))
    }

    /// Whether the player owns `id` in any form.
    pub fn owns(&self, id: &str) -> bool {
        self.owned_ids().any(|owned| owned == id)
    }

    /// Whether `id` is among the consumables.
    pub fn has_consumable(&self, id: &str) -> bool {
        self.consumables.iter().any(|c| c == id)
    }

    /// Remove one copy of a consumable. Returns false if none was held.
    pub fn consume(&mut self, id: &str) -> bool {
        remove_first(&mut self.consumables, id)
    }

    /// Remove one copy of an item from the pool. Returns false if absent.
    pub fn take_from_pool(&mut self, id: &str) -> bool {
        remove_first(&mut self.items, id)
    }
}

fn remove_first(list: &mut Vec<String>, id: &str) -> bool {
    match list.iter().position(|entry| entry == id) {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Equip,
    Unequip,
}

/// Equip an item from the pool.
///
/// The previous occupant, if any, returns to the pool and its `onUnequip`
/// effects finish before the new item's `onEquip` effects run.
pub(crate) fn equip_from_pool(
    story: &Story,
    state: &mut GameState,
    slot: Slot,
    id: &str,
    depth: usize,
) -> Result<(), EquipError> {
    if !state.inventory.items.iter().any(|item| item == id) {
        return Err(EquipError::NotInPool(id.to_string()));
    }
    story.check_slot(id, slot)?;

    unequip_to_pool(story, state, slot, depth);

    // The previous occupant's effects may have moved the item.
    if !state.inventory.take_from_pool(id) {
        return Err(EquipError::NotInPool(id.to_string()));
    }
    place(state, slot, id);
    run_item_effects(story, state, id, Hook::Equip, depth);
    Ok(())
}

/// Put an item straight into a slot without drawing it from the pool.
///
/// Only used for loadout grants. Slot legality still applies.
pub(crate) fn grant_equipped(
    story: &Story,
    state: &mut GameState,
    slot: Slot,
    id: &str,
    depth: usize,
) -> Result<(), EquipError> {
    story.check_slot(id, slot)?;
    unequip_to_pool(story, state, slot, depth);
    place(state, slot, id);
    run_item_effects(story, state, id, Hook::Equip, depth);
    Ok(())
}

/// Return a slot's occupant to the pool. No-op on an empty slot.
pub(crate) fn unequip_to_pool(story: &Story, state: &mut GameState, slot: Slot, depth: usize) {
    let Some(previous) = state.inventory.slot_mut(slot).take() else {
        return;
    };
    state.inventory.items.push(previous.clone());
    run_item_effects(story, state, &previous, Hook::Unequip, depth);
}

fn place(state: &mut GameState, slot: Slot, id: &str) {
    // Nested effects can refill a slot we just emptied.
    if let Some(displaced) = state.inventory.slot_mut(slot).replace(id.to_string()) {
        state.inventory.items.push(displaced);
    }
}

fn run_item_effects(story: &Story, state: &mut GameState, id: &str, hook: Hook, depth: usize) {
    let Some(def) = story.item(id) else {
        return;
    };
    let effects = match hook {
        Hook::Equip => &def.on_equip,
        Hook::Unequip => &def.on_unequip,
    };
    if effects.is_empty() {
        return;
    }
    if depth >= MAX_EFFECT_DEPTH {
        warn!(item = %id, ?hook, depth, "item effects nested too deeply, skipping");
        return;
    }
    effect::apply_in_place(story, state, effects, depth + 1);
}
