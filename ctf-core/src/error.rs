//! Error types for the CTF core library.

use thiserror::Error;

use crate::colour::TeamColour;
use crate::types::{Position, WorldId};

/// Top-level error type for all CTF operations.
///
/// Player-facing rule violations are not errors; they are reported as
/// [`Rejection`](crate::engine::Rejection) outcomes.
#[derive(Error, Debug)]
pub enum CtfError {
    /// An event was prepared while no team with a resolvable colour exists.
    #[error("Cannot deploy flags: no teams are registered")]
    NoTeams,

    /// The nearest-free-space search gave up.
    #[error("No free location for the {colour} flag within {radius} blocks of {target} in {world}")]
    PlacementFailed {
        /// Colour of the flag being placed.
        colour: TeamColour,
        /// Requested position.
        target: Position,
        /// World searched.
        world: WorldId,
        /// Search radius reached before giving up.
        radius: i32,
    },

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The sender of an operator command lacks the required permission.
    #[error("Permission denied: level {required} required, sender has {actual}")]
    PermissionDenied {
        /// Level the command requires.
        required: u8,
        /// Level the sender holds.
        actual: u8,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, CtfError>;
