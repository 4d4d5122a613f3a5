//! Story and state engine for VerseCraft branching narratives.
//!
//! Interprets a declarative story document and advances an immutable
//! [`GameState`] as the player makes choices. Every operation borrows its
//! inputs and returns a fresh value; nothing here performs I/O. Loading
//! documents and persisting saves are left to the caller.

/// Effect list interpretation.
pub mod effect;
/// Story transitions, new-game setup and save sanitization.
pub mod engine;
/// Error types for the engine.
pub mod error;
/// Equipment slots, the items pool and consumables.
pub mod inventory;
/// Tolerant decoding helpers for story documents.
pub mod lenient;
/// Choice requirements and availability.
pub mod requirement;
/// Bounded resource pools.
pub mod resource;
/// Save metadata and JSON round-tripping.
pub mod save;
/// Player state, stats and flags.
pub mod state;
/// Typed story documents.
pub mod story;
/// Structural validation and strict linting of story documents.
pub mod validate;

pub use effect::{Effect, apply_effects};
pub use engine::{
    ChoiceView, choice_views, choose, create_new_game_state, get_current_node,
    sanitize_state_for_story,
};
pub use error::{EngineError, EngineResult, EquipError};
pub use inventory::{Inventory, Slot};
pub use requirement::{Availability, Requirement, is_choice_available};
pub use resource::Resource;
pub use save::SaveMeta;
pub use state::{
    ENGINE_VERSION, FlagValue, GameState, LAST_EQUIP_ERROR_FLAG, STORY_SCHEMA_VERSION, Stats,
};
pub use story::{Choice, ItemDef, Loadout, Node, Story, StoryMeta, load_story};
pub use validate::{ValidationIssue, ValidationReport, lint_story, validate_story};
