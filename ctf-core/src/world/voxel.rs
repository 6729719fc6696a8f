//! Sparse block world with flat default terrain.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use super::MarkerWorld;
use crate::colour::TeamColour;
use crate::config::PlacementConfig;
use crate::error::{CtfError, Result};
use crate::types::{Position, WorldId};

/// A single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    /// Empty space.
    Air,
    /// Natural solid ground.
    Stone,
    /// Solid block laid under markers that would otherwise float on liquid.
    Dirt,
    /// Liquid.
    Water,
    /// Liquid.
    Lava,
    /// Part of a flag marker.
    Marker(TeamColour),
}

impl Block {
    /// Whether this block is a liquid.
    #[must_use]
    pub fn is_liquid(self) -> bool {
        matches!(self, Self::Water | Self::Lava)
    }

    /// Whether a marker may be placed into this block.
    #[must_use]
    pub fn is_replaceable(self) -> bool {
        matches!(self, Self::Air) || self.is_liquid()
    }
}

#[derive(Debug)]
struct Terrain {
    edits: HashMap<(WorldId, Position), Block>,
    ground_level: i32,
    height: i32,
}

impl Terrain {
    fn get(&self, world: WorldId, pos: Position) -> Block {
        if pos.y < 0 {
            return Block::Stone;
        }
        if pos.y >= self.height {
            return Block::Air;
        }
        self.edits.get(&(world, pos)).copied().unwrap_or(if pos.y < self.ground_level {
            Block::Stone
        } else {
            Block::Air
        })
    }

    fn set(&mut self, world: WorldId, pos: Position, block: Block) {
        self.edits.insert((world, pos), block);
    }

    /// Manhattan-shell search outward from `target`, nearest shell first.
    fn nearest_free(&self, world: WorldId, target: Position, cap: i32) -> Option<Position> {
        for r in 0..=cap {
            for dx in -r..=r {
                let rem = r - dx.abs();
                for dz in -rem..=rem {
                    let dy = rem - dz.abs();
                    let below_first = [-dy, dy];
                    let candidates = if dy == 0 { &below_first[..1] } else { &below_first[..] };
                    for &dy in candidates {
                        let pos = target.offset(dx, dy, dz);
                        let in_bounds = pos.y >= 0 && pos.y < self.height;
                        if in_bounds && self.get(world, pos).is_replaceable() {
                            return Some(pos);
                        }
                    }
                }
            }
        }
        None
    }

    /// Drop through air until something other than air is below.
    fn settle(&self, world: WorldId, mut pos: Position) -> Position {
        while pos.y > 0 && self.get(world, pos.down()) == Block::Air {
            pos = pos.down();
        }
        pos
    }
}

/// In-process [`MarkerWorld`]: flat stone up to `ground_level`, air above,
/// plus any blocks written with [`VoxelWorld::set_block`].
#[derive(Debug)]
pub struct VoxelWorld {
    terrain: RwLock<Terrain>,
    spawn: Position,
    search_cap: i32,
}

impl VoxelWorld {
    /// A flat world whose topmost solid layer is `ground_level - 1`, with
    /// height and search cap taken from `config`. Spawn is at the origin on
    /// the surface.
    #[must_use]
    pub fn flat(ground_level: i32, config: &PlacementConfig) -> Self {
        Self {
            terrain: RwLock::new(Terrain {
                edits: HashMap::new(),
                ground_level,
                height: config.world_height,
            }),
            spawn: Position::new(0, ground_level, 0),
            search_cap: config.search_radius_cap,
        }
    }

    /// Move the spawn point.
    #[must_use]
    pub fn with_spawn(mut self, spawn: Position) -> Self {
        self.spawn = spawn;
        self
    }

    /// Block at `pos`.
    #[must_use]
    pub fn block(&self, world: WorldId, pos: Position) -> Block {
        self.terrain.read().get(world, pos)
    }

    /// Overwrite the block at `pos`.
    pub fn set_block(&self, world: WorldId, pos: Position, block: Block) {
        self.terrain.write().set(world, pos, block);
    }

    /// Fill the inclusive box between `a` and `b`.
    pub fn fill(&self, world: WorldId, a: Position, b: Position, block: Block) {
        let mut terrain = self.terrain.write();
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    terrain.set(world, Position::new(x, y, z), block);
                }
            }
        }
    }

    /// Every marker block in `world`, sorted by position.
    #[must_use]
    pub fn markers(&self, world: WorldId) -> Vec<(Position, TeamColour)> {
        let terrain = self.terrain.read();
        let mut markers: Vec<_> = terrain
            .edits
            .iter()
            .filter_map(|(&(w, pos), block)| match block {
                Block::Marker(colour) if w == world => Some((pos, *colour)),
                _ => None,
            })
            .collect();
        markers.sort();
        markers
    }
}

impl MarkerWorld for VoxelWorld {
    fn spawn_point(&self, _world: WorldId) -> Position {
        self.spawn
    }

    fn place_marker(
        &self,
        world: WorldId,
        target: Position,
        colour: TeamColour,
    ) -> Result<Position> {
        let mut terrain = self.terrain.write();
        let free = terrain
            .nearest_free(world, target, self.search_cap)
            .ok_or_else(|| CtfError::PlacementFailed {
                colour,
                target,
                world,
                radius: self.search_cap,
            })?;
        let pos = terrain.settle(world, free);
        terrain.set(world, pos, Block::Marker(colour));

        if terrain.get(world, pos.down()).is_liquid() {
            terrain.set(world, pos.down(), Block::Dirt);
        }

        debug!(%colour, %target, placed = %pos, world = world.0, "Marker placed");
        Ok(pos)
    }

    fn remove_marker(&self, world: WorldId, pos: Position) {
        let mut terrain = self.terrain.write();
        let Block::Marker(colour) = terrain.get(world, pos) else {
            return;
        };

        let mut pending = vec![pos];
        while let Some(p) = pending.pop() {
            terrain.set(world, p, Block::Air);
            for next in [p.up(), p.down()] {
                if terrain.get(world, next) == Block::Marker(colour) {
                    pending.push(next);
                }
            }
        }
        debug!(%colour, %pos, world = world.0, "Marker removed");
    }
}
