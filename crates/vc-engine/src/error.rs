//! Error types for the story engine.

use thiserror::Error;

use crate::inventory::Slot;
use crate::validate::ValidationReport;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors returned by story loading and state transitions.
///
/// Transition errors are non-fatal: the caller keeps the previous state.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The story document failed structural validation.
    #[error("invalid story: {}", .0.errors.join(" "))]
    InvalidStory(ValidationReport),

    /// A story or save document could not be decoded.
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    /// The state points at a node the story does not define.
    #[error("Current node not found: '{0}'.")]
    CurrentNodeNotFound(String),

    /// The choice index is out of range for the current node.
    #[error("Choice not found: {0}.")]
    ChoiceNotFound(usize),

    /// The choice's requirement is not met. Holds the displayable reason.
    #[error("{0}")]
    ChoiceUnavailable(String),
}

/// Reasons an equip attempt is refused.
///
/// The display strings are shown to players verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquipError {
    /// The item is not in the items pool.
    #[error("You don't have '{0}' in your gear.")]
    NotInPool(String),

    /// The story's item catalog has no entry for the item.
    #[error("Unknown item '{0}'.")]
    UnknownItem(String),

    /// The item's catalog entry allows no slots.
    #[error("Item '{0}' is not equipable.")]
    NotEquipable(String),

    /// The item cannot go into the requested slot.
    #[error("Item '{id}' cannot be equipped to {slot}.")]
    WrongSlot {
        /// Item id.
        id: String,
        /// Requested slot.
        slot: Slot,
    },
}
