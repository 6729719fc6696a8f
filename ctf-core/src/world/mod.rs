//! World collaborator — physical flag markers.
//!
//! The engine never touches blocks itself. It asks the host to put a marker
//! "as close as possible" to a target and to take markers away again. The
//! host decides what a free spot is; [`VoxelWorld`] is a complete in-process
//! implementation used by tests, benches and headless servers.

mod voxel;

pub use voxel::{Block, VoxelWorld};

use crate::colour::TeamColour;
use crate::error::Result;
use crate::types::{Position, WorldId};

/// Marker placement operations the engine depends on.
pub trait MarkerWorld: Send + Sync {
    /// The world's spawn point; flag circles are centred near it.
    fn spawn_point(&self, world: WorldId) -> Position;

    /// Place a `colour` marker at the nearest free, ground-supported spot to
    /// `target` and return where it went. A liquid directly beneath the
    /// marker is replaced with a solid block.
    ///
    /// # Errors
    /// Returns [`CtfError::PlacementFailed`](crate::error::CtfError::PlacementFailed)
    /// when no free spot exists within the search cap.
    fn place_marker(
        &self,
        world: WorldId,
        target: Position,
        colour: TeamColour,
    ) -> Result<Position>;

    /// Remove the marker at `pos`, along with vertically adjacent marker
    /// blocks of the same colour. Does nothing if `pos` holds no marker.
    fn remove_marker(&self, world: WorldId, pos: Position);
}
