//! Property tests for engine invariants.

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::{Map, Value, json};
use vc_engine::{
    Effect, GameState, Slot, Story, apply_effects, choose, create_new_game_state,
    get_current_node, load_story, sanitize_state_for_story, validate_story,
};

fn story() -> Story {
    Story::from_value(json!({
        "schemaVersion": 1,
        "meta": { "id": "quarry", "title": "Quarry Road" },
        "start": "gate",
        "resources": {
            "HP": { "label": "Hit Points", "max": 10 },
            "OIL": { "max": 3, "current": 1 }
        },
        "items": {
            "PICK": { "allowedSlots": ["weapon"], "onEquip": [{ "op": "resourceMaxAdd", "key": "HP", "value": 2 }] },
            "VEST": { "allowedSlots": ["armor"], "onUnequip": [{ "op": "resourceAdd", "key": "HP", "value": -1 }] },
            "LAMP": { "allowedSlots": ["special", "weapon"] },
            "ROPE": {}
        },
        "loadout": { "items": ["LAMP"], "equip": { "weapon": "PICK" } },
        "nodes": {
            "gate": {
                "text": "Dust on the road.",
                "choices": [
                    { "text": "Descend", "to": "pit", "effects": [{ "op": "resourceAdd", "key": "OIL", "value": -1 }] },
                    { "text": "Wait", "to": "gate" }
                ]
            },
            "pit": { "text": "Cold stone.", "choices": [{ "text": "Climb", "to": "gate" }] }
        }
    }))
    .unwrap()
}

fn strip_times(mut state: GameState) -> GameState {
    state.updated_at = state.created_at;
    state
}

fn key() -> impl Strategy<Value = String> {
    prop_oneof![Just("HP"), Just("OIL"), Just("ARROWS")].prop_map(str::to_string)
}

fn item() -> impl Strategy<Value = String> {
    prop_oneof![Just("PICK"), Just("VEST"), Just("LAMP"), Just("ROPE")].prop_map(str::to_string)
}

fn slot() -> impl Strategy<Value = Slot> {
    prop_oneof![Just(Slot::Weapon), Just(Slot::Armor), Just(Slot::Special)]
}

fn resource_effect() -> impl Strategy<Value = Effect> {
    prop_oneof![
        (key(), -50i64..50).prop_map(|(key, value)| Effect::ResourceAdd { key, value }),
        (key(), -50i64..50).prop_map(|(key, value)| Effect::ResourceSet { key, value }),
        (key(), -20i64..20).prop_map(|(key, value)| Effect::ResourceMaxAdd { key, value }),
    ]
}

fn catalog_effect() -> impl Strategy<Value = Effect> {
    prop_oneof![
        item().prop_map(|id| Effect::GiveItem { id }),
        (slot(), item()).prop_map(|(slot, id)| Effect::Equip { slot, id }),
        slot().prop_map(|slot| Effect::Unequip { slot }),
        resource_effect(),
    ]
}

/// A resource default or loadout override with any mix of missing, negative
/// and oversized values.
fn resource_def() -> impl Strategy<Value = Value> {
    (
        prop::option::of(-20i64..40),
        prop::option::of(-20i64..60),
        any::<bool>(),
    )
        .prop_map(|(max, current, labelled)| {
            let mut def = Map::new();
            if let Some(max) = max {
                def.insert("max".into(), json!(max));
            }
            if let Some(current) = current {
                def.insert("current".into(), json!(current));
            }
            if labelled {
                def.insert("label".into(), json!("Pool"));
            }
            Value::Object(def)
        })
}

fn resource_defs() -> impl Strategy<Value = BTreeMap<String, Value>> {
    prop::collection::btree_map(key(), resource_def(), 0..4)
}

fn story_with_resources(
    resources: BTreeMap<String, Value>,
    overrides: BTreeMap<String, Value>,
) -> Story {
    load_story(
        &json!({
            "schemaVersion": 1,
            "meta": { "id": "well", "title": "The Well" },
            "start": "rim",
            "resources": resources,
            "loadout": { "resources": overrides },
            "nodes": { "rim": { "text": "Far below, water glints." } }
        })
        .to_string(),
    )
    .unwrap()
}

/// Arbitrary JSON up to a few levels deep.
fn any_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-50i64..50).prop_map(Value::from),
        (-50.0f64..50.0).prop_map(Value::from),
        "[A-Z]{0,3}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z]{1,8}", inner, 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

fn require_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("statGte"),
        Just("resourceGte"),
        Just("resourceLte"),
        Just("hasFlag"),
        Just("hasItem"),
        Just("hasConsumable"),
    ]
    .prop_map(str::to_string)
}

fn assert_resources_in_range(state: &GameState) -> Result<(), TestCaseError> {
    for (key, resource) in &state.resources {
        prop_assert!(resource.max >= 0, "{key} max below zero");
        prop_assert!(resource.current >= 0, "{key} current below zero");
        prop_assert!(resource.current <= resource.max, "{key} current above max");
    }
    Ok(())
}

proptest! {
    /// Every resource stays within 0..=max whatever the effect sequence.
    #[test]
    fn resources_stay_in_range(effects in prop::collection::vec(resource_effect(), 0..40)) {
        let story = story();
        let state = create_new_game_state(&story);
        assert_resources_in_range(&state)?;
        let state = apply_effects(&story, &state, &effects);
        assert_resources_in_range(&state)?;
    }

    /// New games start in range whatever the declared defaults and loadout
    /// overrides, and stay in range under further effects.
    #[test]
    fn new_game_resources_in_range(
        resources in resource_defs(),
        overrides in resource_defs(),
        effects in prop::collection::vec(resource_effect(), 0..10),
    ) {
        let story = story_with_resources(resources, overrides);
        let state = create_new_game_state(&story);
        assert_resources_in_range(&state)?;
        for key in story.resources.keys() {
            prop_assert!(state.resource(key).is_some(), "{key} not seeded");
        }
        let state = apply_effects(&story, &state, &effects);
        assert_resources_in_range(&state)?;
    }

    /// A document that validates always loads and starts.
    #[test]
    fn validated_stories_load(
        require in prop::collection::btree_map(require_key(), any_json(), 0..4),
        resources in any_json(),
        loadout in any_json(),
        description in any_json(),
        item in any_json(),
    ) {
        let doc = json!({
            "schemaVersion": 1,
            "meta": { "id": "maze", "title": "The Maze", "description": description },
            "start": "hall",
            "items": { "THREAD": item },
            "resources": resources,
            "loadout": loadout,
            "nodes": {
                "hall": {
                    "text": "Walls in every direction.",
                    "choices": [{ "text": "Turn left", "to": "hall", "require": require }]
                }
            }
        });
        if validate_story(&doc).ok {
            let story = load_story(&doc.to_string());
            prop_assert!(story.is_ok(), "{:?}", story.as_ref().err());
            if let Ok(story) = story {
                let state = create_new_game_state(&story);
                prop_assert!(get_current_node(&story, &state).is_some());
                assert_resources_in_range(&state)?;
            }
        }
    }

    /// Applying effects one batch at a time matches applying them together.
    #[test]
    fn effect_batches_compose(
        first in prop::collection::vec(catalog_effect(), 0..10),
        second in prop::collection::vec(catalog_effect(), 0..10),
    ) {
        let story = story();
        let start = create_new_game_state(&story);
        let stepwise = apply_effects(&story, &apply_effects(&story, &start, &first), &second);
        let all: Vec<Effect> = first.iter().chain(&second).cloned().collect();
        let together = apply_effects(&story, &start, &all);
        prop_assert_eq!(strip_times(stepwise), strip_times(together));
    }

    /// The same choice sequence always yields the same state.
    #[test]
    fn choose_is_deterministic(path in prop::collection::vec(0usize..2, 0..12)) {
        let story = story();
        let start = create_new_game_state(&story);
        let run = |state: &GameState| -> GameState {
            path.iter().fold(state.clone(), |acc, &index| {
                choose(&story, &acc, index).unwrap_or(acc)
            })
        };
        prop_assert_eq!(strip_times(run(&start)), strip_times(run(&start)));
    }

    /// Unequipping an already empty slot changes nothing.
    #[test]
    fn unequip_is_idempotent(
        setup in prop::collection::vec(catalog_effect(), 0..15),
        slot in slot(),
    ) {
        let story = story();
        let state = apply_effects(&story, &create_new_game_state(&story), &setup);
        let once = apply_effects(&story, &state, &[Effect::Unequip { slot }]);
        prop_assert!(once.inventory.slot(slot).is_none());
        let twice = apply_effects(&story, &once, &[Effect::Unequip { slot }]);
        prop_assert_eq!(strip_times(once), strip_times(twice));
    }

    /// States built only from catalog items survive sanitization untouched.
    #[test]
    fn sanitize_keeps_consistent_states(setup in prop::collection::vec(catalog_effect(), 0..20)) {
        let story = story();
        let state = apply_effects(&story, &create_new_game_state(&story), &setup);
        let cleaned = sanitize_state_for_story(&story, &state);
        prop_assert_eq!(strip_times(cleaned), strip_times(state));
    }
}
