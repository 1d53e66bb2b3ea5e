//! Error types for the combat engine.

use thiserror::Error;

use crate::combatant::CombatantId;

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Top-level error type for all combat engine errors.
///
/// None of these are reachable through normal play; they indicate malformed
/// content or a caller driving the engine out of order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BattleError {
    /// A battle template with no monsters.
    #[error("Cannot create battle with no monsters")]
    NoMonsters,

    /// A stance name that does not name one of the six stances.
    #[error("Unknown stance: {0:?}")]
    UnknownStance(String),

    /// Target entry point given something other than a living monster.
    #[error("Invalid target: {0}")]
    InvalidTarget(CombatantId),

    /// The battle already reached a terminal state.
    #[error("Battle is already over")]
    BattleOver,

    /// The battle has not reached a terminal state yet.
    #[error("Battle has not finished")]
    NotFinished,

    /// Level outside the level table.
    #[error("Unknown level: {0}")]
    UnknownLevel(u32),

    /// Content file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParse {
        /// Path (or label) of the content that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },
}
