//! Save metadata and JSON round-tripping.
//!
//! Storage itself belongs to the caller. The engine only guarantees that a
//! [`GameState`] survives a JSON round trip with its full field set, and
//! supplies the small summary shown next to each save slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::state::GameState;

/// Summary of a saved run, stored beside the full state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMeta {
    /// Caller-chosen slot number.
    pub slot: u32,
    /// Id of the story the save belongs to.
    pub story_id: String,
    /// Title of the story the save belongs to.
    pub story_title: String,
    /// Node the run is paused at.
    pub node_id: String,
    /// When the state last changed.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl GameState {
    /// Summarize this state for a save slot.
    pub fn save_meta(&self, slot: u32) -> SaveMeta {
        SaveMeta {
            slot,
            story_id: self.story_id.clone(),
            story_title: self.story_title.clone(),
            node_id: self.node_id.clone(),
            updated_at: self.updated_at,
        }
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a saved state. Saves written before resources existed
    /// load with no resources.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{choose, create_new_game_state};
    use crate::state::FlagValue;
    use crate::story::Story;
    use serde_json::{Value, json};

    fn story() -> Story {
        Story::from_value(json!({
            "schemaVersion": 1,
            "meta": { "id": "mill", "title": "The Old Mill" },
            "start": "yard",
            "resources": { "HP": { "label": "Hit Points", "max": 8 } },
            "items": { "SICKLE": { "allowedSlots": ["weapon"] } },
            "loadout": { "equip": { "weapon": "SICKLE" }, "consumables": ["BREAD"] },
            "nodes": {
                "yard": {
                    "text": "The wheel creaks.",
                    "choices": [{
                        "text": "Go inside",
                        "to": "loft",
                        "effects": [{ "op": "flagSet", "key": "INSIDE", "value": true }]
                    }]
                },
                "loft": { "text": "Flour dust hangs in the air." }
            }
        }))
        .unwrap()
    }

    #[test]
    fn round_trip_preserves_state() {
        let story = story();
        let state = choose(&story, &create_new_game_state(&story), 0).unwrap();
        let restored = GameState::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(restored, state);
        let restored = GameState::from_json(&state.to_json_pretty().unwrap()).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn serialized_field_names() {
        let story = story();
        let state = create_new_game_state(&story);
        let value: Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();
        for key in [
            "engineVersion",
            "schemaVersion",
            "storyId",
            "storyTitle",
            "nodeId",
            "stats",
            "resources",
            "inventory",
            "flags",
            "visited",
            "createdAt",
            "updatedAt",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["inventory"]["weapon"], json!("SICKLE"));
        assert_eq!(value["inventory"]["armor"], Value::Null);
        assert_eq!(value["resources"]["HP"], json!({ "label": "Hit Points", "current": 8, "max": 8 }));
        assert!(value["updatedAt"].is_i64());
    }

    #[test]
    fn loads_saves_from_earlier_engine() {
        let saved = json!({
            "engineVersion": "1.0.1",
            "schemaVersion": 1,
            "storyId": "mill",
            "storyTitle": "The Old Mill",
            "nodeId": "loft",
            "stats": { "WISDOM": 2, "ENDURANCE": 1, "AGILITY": 1, "LUCK": 3, "TIMING": 1, "HEALTH": 9 },
            "inventory": { "weapon": null, "armor": null, "special": null, "consumables": ["BREAD"], "items": [] },
            "flags": { "INSIDE": true, "__LAST_EQUIP_ERROR__": "You don't have 'AXE' in your gear." },
            "visited": { "yard": 1 },
            "createdAt": 1700000000000_i64,
            "updatedAt": 1700000360000_i64
        });
        let state = GameState::from_json(&saved.to_string()).unwrap();
        assert!(state.resources.is_empty());
        assert_eq!(state.stats.luck, 3);
        assert_eq!(state.visits("yard"), 1);
        assert_eq!(state.flags["INSIDE"], FlagValue::Bool(true));
        assert_eq!(state.last_equip_error(), Some("You don't have 'AXE' in your gear."));
        assert_eq!(state.updated_at.timestamp_millis(), 1_700_000_360_000);
    }

    #[test]
    fn save_meta_summarizes() {
        let story = story();
        let state = create_new_game_state(&story);
        let meta = state.save_meta(2);
        assert_eq!(meta.slot, 2);
        assert_eq!(meta.story_id, "mill");
        assert_eq!(meta.story_title, "The Old Mill");
        assert_eq!(meta.node_id, "yard");
        assert_eq!(meta.updated_at, state.updated_at);

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["storyTitle"], json!("The Old Mill"));
        assert_eq!(value["updatedAt"], json!(state.updated_at.timestamp_millis()));
    }

    #[test]
    fn malformed_save_is_an_error() {
        assert!(GameState::from_json(r#"{ "storyId": 3 }"#).is_err());
    }
}
