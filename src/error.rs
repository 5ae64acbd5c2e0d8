//! Error types for the movement controller and its persistence helpers.

use thiserror::Error;

/// Misuse of the movement API by a script or caller.
///
/// A request that fails with one of these leaves the character untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidStateError {
    /// No character is registered under this id
    #[error("invalid character id {0}")]
    UnknownCharacter(usize),

    /// The character is not in the room currently being simulated
    #[error("character {id} is in room {room}, not in the active room {active_room}")]
    NotInActiveRoom {
        /// Character id
        id: usize,
        /// Room the character is in
        room: i32,
        /// Room being simulated
        active_room: i32,
    },

    /// The character is switched off and cannot be moved
    #[error("character {0} is turned off and cannot be moved")]
    Disabled(usize),

    /// Two characters that must share a room do not
    #[error("characters {first} and {second} are in different rooms")]
    DifferentRooms {
        /// First character id
        first: usize,
        /// Second character id
        second: usize,
    },

    /// A waypoint was added while the character was not following a plan
    #[error("character {0} is not following a movement plan")]
    NotMoving(usize),

    /// The plan already holds the maximum number of stages
    #[error("movement plan of character {id} is too complex: at most {max} waypoints")]
    PlanAtCapacity {
        /// Character id
        id: usize,
        /// Plan capacity
        max: usize,
    },
}

/// Errors raised while saving or loading a controller snapshot or command log
#[derive(Debug, Error)]
pub enum SaveStateError {
    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The saved walkable mask is not a grid of `rows` x `cols` cells
    #[error("walkable mask of {rows}x{cols} cells holds {found} cell values")]
    InvalidMask {
        /// Saved row count
        rows: i32,
        /// Saved column count
        cols: i32,
        /// Number of cell values found
        found: usize,
    },
}

/// Errors raised while reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed TOML
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
