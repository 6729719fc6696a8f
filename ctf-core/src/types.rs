//! Core type definitions for the CTF engine.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// A player, identified by their (unique) account name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Create a player id from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The player's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A team, identified by its scoreboard name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl TeamId {
    /// Create a team id from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A world (dimension). Flags are always deployed in the overworld but can be
/// carried into and dropped in any world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorldId(pub i32);

impl WorldId {
    /// The main world.
    pub const OVERWORLD: Self = Self(0);

    /// Whether this is the main world.
    #[must_use]
    pub fn is_overworld(self) -> bool {
        self == Self::OVERWORLD
    }
}

impl Default for WorldId {
    fn default() -> Self {
        Self::OVERWORLD
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world {}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// An integer block position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (height).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl Position {
    /// Construct a position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The position offset by the given deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// One block up.
    #[must_use]
    pub const fn up(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// One block down.
    #[must_use]
    pub const fn down(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// Horizontal (x/z) distance to a point.
    #[must_use]
    pub fn horizontal_distance(self, x: f64, z: f64) -> f64 {
        (f64::from(self.x) - x).hypot(f64::from(self.z) - z)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[X:{}, Y:{}, Z:{}]", self.x, self.y, self.z)
    }
}

/// A position qualified by its world, rendered the way map mods expect:
/// `[X:1, Y:2, Z:3]` in the overworld, `[X:1, Y:2, Z:3, DIM:-1]` elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldPos {
    /// Block position.
    pub pos: Position,
    /// World containing it.
    pub world: WorldId,
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.world.is_overworld() {
            fmt::Display::fmt(&self.pos, f)
        } else {
            write!(
                f,
                "[X:{}, Y:{}, Z:{}, DIM:{}]",
                self.pos.x, self.pos.y, self.pos.z, self.world.0
            )
        }
    }
}

/// Live snapshot of an online player, supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Player identity.
    pub id: PlayerId,
    /// World the player is in.
    pub world: WorldId,
    /// Block position of the player's feet.
    pub position: Position,
}

impl Player {
    /// Snapshot a player standing at `position` in `world`.
    #[must_use]
    pub fn new(id: PlayerId, world: WorldId, position: Position) -> Self {
        Self { id, world, position }
    }

    /// The player's position qualified by world.
    #[must_use]
    pub fn world_pos(&self) -> WorldPos {
        WorldPos {
            pos: self.position,
            world: self.world,
        }
    }
}

// ---------------------------------------------------------------------------
// Event phase
// ---------------------------------------------------------------------------

/// Lifecycle of a flag event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No event running; no flags in the world.
    Inactive,
    /// Flags deployed and known to their owners; capturing disabled.
    Preparation,
    /// Flags public; picking up and capturing enabled.
    Active,
}

impl Phase {
    /// Interpret the two persisted phase booleans.
    ///
    /// `active` without `prepared` cannot be reached through the engine; it is
    /// read as `Active` so a hand-edited save still allows `Stop`.
    #[must_use]
    pub fn from_flags(prepared: bool, active: bool) -> Self {
        match (prepared, active) {
            (_, true) => Self::Active,
            (true, false) => Self::Preparation,
            (false, false) => Self::Inactive,
        }
    }

    /// The phase the operator command moves to from here.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Inactive => Self::Preparation,
            Self::Preparation => Self::Active,
            Self::Active => Self::Inactive,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inactive => "inactive",
            Self::Preparation => "preparation",
            Self::Active => "active",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_cycles_through_all_states() {
        assert_eq!(Phase::Inactive.next(), Phase::Preparation);
        assert_eq!(Phase::Preparation.next(), Phase::Active);
        assert_eq!(Phase::Active.next(), Phase::Inactive);
    }

    #[test]
    fn phase_from_flags() {
        assert_eq!(Phase::from_flags(false, false), Phase::Inactive);
        assert_eq!(Phase::from_flags(true, false), Phase::Preparation);
        assert_eq!(Phase::from_flags(true, true), Phase::Active);
    }

    #[test]
    fn world_pos_mentions_dimension_outside_overworld() {
        let pos = Position::new(10, 64, -3);
        let home = WorldPos { pos, world: WorldId::OVERWORLD };
        let nether = WorldPos { pos, world: WorldId(-1) };
        assert_eq!(home.to_string(), "[X:10, Y:64, Z:-3]");
        assert_eq!(nether.to_string(), "[X:10, Y:64, Z:-3, DIM:-1]");
    }
}
