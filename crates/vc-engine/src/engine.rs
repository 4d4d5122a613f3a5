//! Story transitions, new-game setup and save sanitization.

use serde::Serialize;
use tracing::debug;

use crate::effect::apply_in_place;
use crate::error::{EngineError, EngineResult};
use crate::inventory::{self, Slot};
use crate::requirement::is_choice_available;
use crate::resource::Resource;
use crate::state::GameState;
use crate::story::{Loadout, Node, Story};

/// Create the state for a new run of a validated story.
///
/// Resources are seeded from the story's defaults, then the loadout is
/// applied: pooled items and consumables first, then starting equipment
/// (weapon, armor, special), then resource overrides.
pub fn create_new_game_state(story: &Story) -> GameState {
    let mut state = GameState::new(story);

    for (key, def) in &story.resources {
        let label = def.label.clone().unwrap_or_else(|| key.clone());
        let max = def.max.unwrap_or(0);
        let current = def.current.unwrap_or(max);
        state
            .resources
            .insert(key.clone(), Resource::with_current(label, current, max));
    }

    if let Some(loadout) = &story.loadout {
        apply_loadout(story, &mut state, loadout);
    }

    state.touch();
    debug!(story = %story.meta.id, node = %state.node_id, "new game state created");
    state
}

fn apply_loadout(story: &Story, state: &mut GameState, loadout: &Loadout) {
    state.inventory.items.extend(loadout.items.iter().cloned());
    state
        .inventory
        .consumables
        .extend(loadout.consumables.iter().cloned());

    for (slot, id) in loadout.equip.iter() {
        equip_starting_item(story, state, slot, id);
    }

    for (key, patch) in &loadout.resources {
        let Some(resource) = state.resources.get_mut(key) else {
            debug!(resource = %key, "loadout override for undeclared resource ignored");
            continue;
        };
        if let Some(max) = patch.max {
            resource.set_max(max);
        }
        if let Some(current) = patch.current {
            resource.set(current);
        }
        if let Some(label) = &patch.label {
            resource.label = label.clone();
        }
    }
}

/// Pooled items go through the normal equip path; anything else is granted
/// straight into the slot if the catalog allows it. Refusals are dropped.
fn equip_starting_item(story: &Story, state: &mut GameState, slot: Slot, id: &str) {
    let result = if state.inventory.items.iter().any(|item| item == id) {
        inventory::equip_from_pool(story, state, slot, id, 0)
    } else {
        inventory::grant_equipped(story, state, slot, id, 0)
    };
    if let Err(err) = result {
        debug!(%slot, item = %id, error = %err, "starting equipment dropped");
    }
}

/// The node the state currently points at, if the story defines it.
pub fn get_current_node<'a>(story: &'a Story, state: &GameState) -> Option<&'a Node> {
    story.node(&state.node_id)
}

/// Take a choice from the current node.
///
/// Returns the new state; the input state is never modified. The target
/// node is not checked here: a dangling `to` is reported by the next
/// lookup.
pub fn choose(story: &Story, state: &GameState, choice_index: usize) -> EngineResult<GameState> {
    let node = get_current_node(story, state)
        .ok_or_else(|| EngineError::CurrentNodeNotFound(state.node_id.clone()))?;
    let choice = node
        .choices
        .get(choice_index)
        .ok_or(EngineError::ChoiceNotFound(choice_index))?;

    if let Some(reason) = is_choice_available(state, choice).reason() {
        return Err(EngineError::ChoiceUnavailable(reason.to_string()));
    }

    let mut next = state.clone();
    *next.visited.entry(next.node_id.clone()).or_insert(0) += 1;
    apply_in_place(story, &mut next, &choice.effects, 0);
    next.node_id = choice.to.clone();
    next.touch();

    debug!(from = %state.node_id, to = %next.node_id, choice = choice_index, "transition");
    Ok(next)
}

/// A choice as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceView {
    /// Choice text.
    pub text: String,
    /// Whether the choice can be taken now.
    pub available: bool,
    /// Why the choice is locked, if it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// View-models for every choice of the current node, in order.
///
/// Empty when the current node is missing.
pub fn choice_views(story: &Story, state: &GameState) -> Vec<ChoiceView> {
    let Some(node) = get_current_node(story, state) else {
        return Vec::new();
    };
    node.choices
        .iter()
        .map(|choice| {
            let availability = is_choice_available(state, choice);
            ChoiceView {
                text: choice.text.clone(),
                available: availability.is_available(),
                reason: availability.reason().map(str::to_string),
            }
        })
        .collect()
}

/// Strip items a story's catalog does not know from a loaded state.
///
/// Stories without a catalog leave the state as is. Consumables are never
/// filtered.
pub fn sanitize_state_for_story(story: &Story, state: &GameState) -> GameState {
    let mut next = state.clone();
    let Some(catalog) = &story.items else {
        return next;
    };

    for slot in Slot::ALL {
        let equipped = next.inventory.slot_mut(slot);
        if equipped.as_ref().is_some_and(|id| !catalog.contains_key(id)) {
            debug!(%slot, item = ?equipped, "clearing unknown equipped item");
            *equipped = None;
        }
    }
    next.inventory.items.retain(|id| catalog.contains_key(id));

    next.touch();
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LAST_EQUIP_ERROR_FLAG, Stats};
    use serde_json::{Value, json};

    fn story_from(value: Value) -> Story {
        Story::from_value(value).unwrap()
    }

    fn lighthouse() -> Story {
        story_from(json!({
            "schemaVersion": 1,
            "meta": { "id": "lighthouse", "title": "The Lighthouse" },
            "start": "shore",
            "resources": {
                "HP": { "label": "Hit Points", "max": 10 },
                "CR": { "label": "Credits", "max": 100, "current": 250 },
                "REP": { "max": 5, "current": 2 }
            },
            "items": {
                "LANTERN": {
                    "allowedSlots": ["special"],
                    "onEquip": [{ "op": "flagSet", "key": "LIT", "value": true }],
                    "onUnequip": [{ "op": "flagSet", "key": "LIT", "value": false }]
                },
                "KNIFE": {
                    "allowedSlots": ["weapon"],
                    "onEquip": [{ "op": "statAdd", "key": "AGILITY", "value": 1 }]
                },
                "COAT": { "allowedSlots": ["armor"] },
                "KEY": {}
            },
            "loadout": {
                "items": ["KNIFE", "ROPE"],
                "consumables": ["WATER", "WATER"],
                "equip": { "weapon": "KNIFE", "special": "LANTERN", "armor": "KEY" },
                "resources": {
                    "HP": { "current": 7 },
                    "REP": { "max": 3, "label": "Reputation" },
                    "GHOST": { "max": 9 }
                }
            },
            "nodes": {
                "shore": {
                    "text": "Waves break on the rocks.",
                    "choices": [
                        { "text": "Climb the stairs", "to": "stairs" },
                        {
                            "text": "Unlock the door",
                            "to": "door",
                            "require": { "hasItem": ["KEY"] }
                        },
                        {
                            "text": "Pay the keeper",
                            "to": "stairs",
                            "require": { "resourceGte": { "CR": 20 } },
                            "effects": [{ "op": "resourceAdd", "key": "CR", "value": -20 }]
                        },
                        { "text": "Swim out", "to": "reef" }
                    ]
                },
                "stairs": {
                    "text": "The stairs spiral upward.",
                    "choices": [
                        {
                            "text": "Pick up the key",
                            "to": "shore",
                            "effects": [{ "op": "giveItem", "id": "KEY" }]
                        }
                    ]
                },
                "door": { "text": "The door swings open." }
            }
        }))
    }

    fn without_timestamps(state: &GameState) -> GameState {
        let mut state = state.clone();
        state.updated_at = state.created_at;
        state
    }

    #[test]
    fn new_game_seeds_stats_and_resources() {
        let state = create_new_game_state(&lighthouse());
        assert_eq!(state.node_id, "shore");
        assert_eq!(state.story_id, "lighthouse");
        assert_eq!(state.stats.wisdom, 1);
        assert_eq!(state.stats.agility, 2); // KNIFE onEquip
        assert_eq!(state.stats.health, Stats::default().health);

        let hp = &state.resources["HP"];
        assert_eq!((hp.label.as_str(), hp.current, hp.max), ("Hit Points", 7, 10));
        let cr = &state.resources["CR"];
        assert_eq!((cr.current, cr.max), (100, 100));
        let rep = &state.resources["REP"];
        assert_eq!((rep.label.as_str(), rep.current, rep.max), ("Reputation", 2, 3));
        assert!(!state.resources.contains_key("GHOST"));
    }

    #[test]
    fn new_game_applies_loadout_equipment() {
        let state = create_new_game_state(&lighthouse());
        // KNIFE came from the pool.
        assert_eq!(state.inventory.weapon.as_deref(), Some("KNIFE"));
        assert_eq!(state.inventory.items, vec!["ROPE"]);
        // LANTERN was granted directly and its onEquip fired.
        assert_eq!(state.inventory.special.as_deref(), Some("LANTERN"));
        assert!(state.flag("LIT"));
        // KEY is not equipable, so the grant was dropped.
        assert_eq!(state.inventory.armor, None);
        assert!(!state.flags.contains_key(LAST_EQUIP_ERROR_FLAG));
        assert_eq!(state.inventory.consumables, vec!["WATER", "WATER"]);
    }

    #[test]
    fn new_game_without_resources_or_loadout() {
        let story = story_from(json!({
            "schemaVersion": 1,
            "meta": { "id": "tiny", "title": "Tiny" },
            "start": "a",
            "nodes": { "a": { "text": "The end." } }
        }));
        let state = create_new_game_state(&story);
        assert!(state.resources.is_empty());
        assert_eq!(state.inventory, Default::default());
    }

    #[test]
    fn choose_advances_and_counts_visits() {
        let story = lighthouse();
        let state = create_new_game_state(&story);
        let next = choose(&story, &state, 0).unwrap();
        assert_eq!(next.node_id, "stairs");
        assert_eq!(next.visits("shore"), 1);
        assert_eq!(next.visits("stairs"), 0);
        assert_eq!(state.node_id, "shore");
        assert!(state.visited.is_empty());

        let back = choose(&story, &next, 0).unwrap();
        let again = choose(&story, &back, 0).unwrap();
        assert_eq!(again.visits("shore"), 2);
        assert_eq!(again.visits("stairs"), 1);
    }

    #[test]
    fn choose_applies_effects() {
        let story = lighthouse();
        let state = create_new_game_state(&story);
        let next = choose(&story, &state, 2).unwrap();
        assert_eq!(next.resources["CR"].current, 80);
        assert_eq!(next.node_id, "stairs");
    }

    #[test]
    fn choose_respects_requirements() {
        let story = lighthouse();
        let state = create_new_game_state(&story);
        let err = choose(&story, &state, 1).unwrap_err();
        assert_eq!(err.to_string(), "Requires item: KEY");

        let at_stairs = choose(&story, &state, 0).unwrap();
        let with_key = choose(&story, &at_stairs, 0).unwrap();
        let through = choose(&story, &with_key, 1).unwrap();
        assert_eq!(through.node_id, "door");
    }

    #[test]
    fn choose_out_of_range() {
        let story = lighthouse();
        let state = create_new_game_state(&story);
        assert!(matches!(
            choose(&story, &state, 9),
            Err(EngineError::ChoiceNotFound(9))
        ));
    }

    #[test]
    fn dangling_target_surfaces_on_next_lookup() {
        let story = lighthouse();
        let state = create_new_game_state(&story);
        let adrift = choose(&story, &state, 3).unwrap();
        assert_eq!(adrift.node_id, "reef");
        assert!(get_current_node(&story, &adrift).is_none());
        assert!(choice_views(&story, &adrift).is_empty());
        assert!(matches!(
            choose(&story, &adrift, 0),
            Err(EngineError::CurrentNodeNotFound(ref id)) if id == "reef"
        ));
    }

    #[test]
    fn choose_is_deterministic() {
        let story = lighthouse();
        let state = create_new_game_state(&story);
        let a = choose(&story, &state, 2).unwrap();
        let b = choose(&story, &state, 2).unwrap();
        assert_eq!(without_timestamps(&a), without_timestamps(&b));
    }

    #[test]
    fn choice_views_report_locks() {
        let story = lighthouse();
        let state = create_new_game_state(&story);
        let views = choice_views(&story, &state);
        assert_eq!(views.len(), 4);
        assert!(views[0].available);
        assert_eq!(views[0].reason, None);
        assert!(!views[1].available);
        assert_eq!(views[1].reason.as_deref(), Some("Requires item: KEY"));
        assert_eq!(views[2].text, "Pay the keeper");
    }

    #[test]
    fn sanitize_without_catalog_keeps_everything() {
        let story = story_from(json!({
            "schemaVersion": 1,
            "meta": { "id": "open", "title": "Open" },
            "start": "a",
            "nodes": { "a": { "text": "" } }
        }));
        let mut state = create_new_game_state(&story);
        state.inventory.weapon = Some("ALIEN_BLASTER".to_string());
        state.inventory.items.push("MOON_ROCK".to_string());
        let clean = sanitize_state_for_story(&story, &state);
        assert_eq!(clean, state);
    }

    #[test]
    fn sanitize_strips_foreign_items_but_not_consumables() {
        let story = lighthouse();
        let mut state = create_new_game_state(&story);
        state.inventory.armor = Some("ALIEN_BLASTER".to_string());
        state.inventory.items.push("MOON_ROCK".to_string());
        state.inventory.items.push("COAT".to_string());
        state.inventory.consumables.push("STARDUST".to_string());

        let clean = sanitize_state_for_story(&story, &state);
        assert_eq!(clean.inventory.armor, None);
        assert_eq!(clean.inventory.weapon.as_deref(), Some("KNIFE"));
        assert_eq!(clean.inventory.special.as_deref(), Some("LANTERN"));
        // ROPE is in the loadout but not the catalog.
        assert_eq!(clean.inventory.items, vec!["COAT"]);
        assert!(clean.inventory.consumables.contains(&"STARDUST".to_string()));
    }

    #[test]
    fn sanitize_consistent_state_is_noop() {
        let story = lighthouse();
        let mut state = create_new_game_state(&story);
        state.inventory.items.retain(|id| id != "ROPE");
        let clean = sanitize_state_for_story(&story, &state);
        assert_eq!(without_timestamps(&clean), without_timestamps(&state));
    }
}
