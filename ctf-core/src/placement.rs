//! Flag placement and flag-position bookkeeping.
//!
//! Flags are spread evenly around a circle whose centre, radius and starting
//! angle are random, and the order in which colours take their slots is a
//! fresh random permutation each event, so no team can predict where its
//! neighbours will be.
//!
//! ```text
//!              slot 1
//!                 ●
//!        slot 0 ●   ● slot 2        θᵢ = θ₀ + i·2π/N
//!                 ×  ← centre = spawn ± furthest_centre
//!        slot N-1 ●  ●
//! ```

use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::colour::TeamColour;
use crate::config::PlacementConfig;
use crate::error::{CtfError, Result};
use crate::keys;
use crate::store::{KeyValueStore, StoreExt, normalize_key};
use crate::types::{Position, WorldId, WorldPos};
use crate::world::MarkerWorld;

/// One colour's slot on the circle.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSlot {
    /// Colour assigned to the slot.
    pub colour: TeamColour,
    /// Angle of the slot in radians (not reduced modulo 2π).
    pub angle: f64,
    /// Position the placement search starts from.
    pub target: Position,
}

/// The randomized circle a deployment uses.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleLayout {
    /// Centre x.
    pub centre_x: i32,
    /// Centre z.
    pub centre_z: i32,
    /// Radius in blocks.
    pub radius: i32,
    /// Angle of the first slot.
    pub start_angle: f64,
    /// Slots in placement order.
    pub slots: Vec<FlagSlot>,
}

impl CircleLayout {
    /// Angle between consecutive slots.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn spacing(&self) -> f64 {
        TAU / self.slots.len() as f64
    }
}

/// Choose a circle and assign every colour a slot on it.
///
/// Duplicate colours are collapsed before shuffling.
///
/// # Errors
/// Returns [`CtfError::NoTeams`] if `colours` is empty.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn plan_circle<R: Rng + ?Sized>(
    colours: &[TeamColour],
    spawn: Position,
    config: &PlacementConfig,
    rng: &mut R,
) -> Result<CircleLayout> {
    let mut order = colours.to_vec();
    order.sort_unstable();
    order.dedup();
    if order.is_empty() {
        return Err(CtfError::NoTeams);
    }
    order.shuffle(rng);

    let centre_x = spawn.x + rng.gen_range(-config.furthest_centre..=config.furthest_centre);
    let centre_z = spawn.z + rng.gen_range(-config.furthest_centre..=config.furthest_centre);
    let radius = rng.gen_range(config.min_radius..=config.max_radius);
    let start_angle = rng.gen_range(0.0..TAU);
    let step = TAU / order.len() as f64;

    let slots = order
        .into_iter()
        .enumerate()
        .map(|(i, colour)| {
            let angle = start_angle + step * i as f64;
            let r = f64::from(radius);
            // `as` truncates toward zero.
            let x = centre_x + (r * angle.cos()) as i32;
            let z = centre_z + (r * angle.sin()) as i32;
            FlagSlot {
                colour,
                angle,
                target: Position::new(x, config.deploy_height, z),
            }
        })
        .collect();

    Ok(CircleLayout {
        centre_x,
        centre_z,
        radius,
        start_angle,
        slots,
    })
}

/// Persisted state of one flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagState {
    /// Where the flag was deployed this event.
    pub home: Position,
    /// Where the flag was last placed or dropped.
    pub current: WorldPos,
    /// Whether a marker currently represents the flag.
    pub in_world: bool,
}

/// Places, moves and removes flag markers and records where they are.
pub struct FlagPlacer {
    store: Arc<dyn KeyValueStore>,
    world: Arc<dyn MarkerWorld>,
    config: PlacementConfig,
}

impl std::fmt::Debug for FlagPlacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagPlacer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FlagPlacer {
    /// Create a placer over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        world: Arc<dyn MarkerWorld>,
        config: PlacementConfig,
    ) -> Self {
        Self {
            store,
            world,
            config,
        }
    }

    /// Deploy one flag per colour around a random circle near `world`'s spawn
    /// and record each as home, current and in-world.
    ///
    /// # Errors
    /// Returns [`CtfError::NoTeams`] for an empty colour list, or the first
    /// placement / store failure. Flags placed before a failure stay recorded
    /// as in-world so a later `remove_all` cleans them up.
    pub fn deploy_all<R: Rng + ?Sized>(
        &self,
        world: WorldId,
        colours: &[TeamColour],
        rng: &mut R,
    ) -> Result<BTreeMap<TeamColour, Position>> {
        let spawn = self.world.spawn_point(world);
        let layout = plan_circle(colours, spawn, &self.config, rng)?;
        info!(
            flags = layout.slots.len(),
            centre_x = layout.centre_x,
            centre_z = layout.centre_z,
            radius = layout.radius,
            "Deploying flags"
        );

        let mut placed = BTreeMap::new();
        for slot in &layout.slots {
            let pos = self.world.place_marker(world, slot.target, slot.colour)?;
            self.store.set_position(&keys::flag_home(slot.colour), pos)?;
            self.record_current(slot.colour, world, pos)?;
            placed.insert(slot.colour, pos);
        }
        Ok(placed)
    }

    /// Put `colour` back at its recorded home.
    ///
    /// # Errors
    /// Returns a placement or store failure.
    pub fn return_home(&self, world: WorldId, colour: TeamColour) -> Result<Position> {
        let home = self.store.get_position(&keys::flag_home(colour))?;
        self.place_at(world, home, colour)
    }

    /// Place `colour` as near `target` as possible and record it as current.
    ///
    /// # Errors
    /// Returns a placement or store failure.
    pub fn place_at(
        &self,
        world: WorldId,
        target: Position,
        colour: TeamColour,
    ) -> Result<Position> {
        let pos = self.world.place_marker(world, target, colour)?;
        self.record_current(colour, world, pos)?;
        Ok(pos)
    }

    /// Take the `colour` marker at `pos` out of the world.
    ///
    /// # Errors
    /// Returns a store failure.
    pub fn take(&self, world: WorldId, pos: Position, colour: TeamColour) -> Result<()> {
        self.store.set_bool(&keys::flag_in_world(colour), false)?;
        self.world.remove_marker(world, pos);
        debug!(%colour, %pos, "Flag taken from world");
        Ok(())
    }

    /// Remove every in-world flag and clear the carried flag of every player
    /// who has ever held one, online or not. Returns how many markers were
    /// removed.
    ///
    /// # Errors
    /// Returns a store failure.
    pub fn remove_all(&self) -> Result<usize> {
        let mut removed = 0;
        for colour in TeamColour::ALL {
            let state = self.flag_state(colour)?;
            if state.in_world {
                self.world.remove_marker(state.current.world, state.current.pos);
                self.store.set_bool(&keys::flag_in_world(colour), false)?;
                removed += 1;
            }
        }

        let mut carriers = 0;
        for key in self.store.keys_with_prefix(&normalize_key(&keys::has_flag_prefix()))? {
            if self.store.load(&key)? == Some(1) {
                carriers += 1;
            }
            self.store.save(&key, 0)?;
        }

        info!(removed, carriers, "Flags removed");
        Ok(removed)
    }

    /// Read the persisted state of `colour`.
    ///
    /// # Errors
    /// Returns a store failure.
    pub fn flag_state(&self, colour: TeamColour) -> Result<FlagState> {
        Ok(FlagState {
            home: self.store.get_position(&keys::flag_home(colour))?,
            current: WorldPos {
                pos: self.store.get_position(&keys::flag_position(colour))?,
                world: WorldId(self.store.get_int(&keys::flag_dimension(colour))?),
            },
            in_world: self.store.get_bool(&keys::flag_in_world(colour))?,
        })
    }

    fn record_current(&self, colour: TeamColour, world: WorldId, pos: Position) -> Result<()> {
        self.store.set_position(&keys::flag_position(colour), pos)?;
        self.store.set_int(&keys::flag_dimension(colour), world.0)?;
        self.store.set_bool(&keys::flag_in_world(colour), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::PlayerId;
    use crate::world::{Block, VoxelWorld};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const GROUND: i32 = 64;

    struct Fixture {
        store: Arc<MemoryStore>,
        world: Arc<VoxelWorld>,
        placer: FlagPlacer,
    }

    fn fixture() -> Fixture {
        let config = PlacementConfig::default();
        let store = Arc::new(MemoryStore::new());
        let world = Arc::new(VoxelWorld::flat(GROUND, &config));
        let placer = FlagPlacer::new(store.clone(), world.clone(), config);
        Fixture {
            store,
            world,
            placer,
        }
    }

    #[test]
    fn empty_colour_list_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = plan_circle(&[], Position::default(), &PlacementConfig::default(), &mut rng)
            .expect_err("no teams");
        assert!(matches!(err, CtfError::NoTeams));
    }

    #[test]
    fn duplicate_colours_get_one_slot() {
        let mut rng = StdRng::seed_from_u64(2);
        let layout = plan_circle(
            &[TeamColour::Red, TeamColour::Red, TeamColour::Blue],
            Position::default(),
            &PlacementConfig::default(),
            &mut rng,
        )
        .expect("plan");
        assert_eq!(layout.slots.len(), 2);
    }

    #[test]
    fn layout_respects_bounds() {
        let config = PlacementConfig::default();
        let spawn = Position::new(1000, 64, -1000);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let layout = plan_circle(&TeamColour::ALL, spawn, &config, &mut rng).expect("plan");
            assert!((layout.centre_x - spawn.x).abs() <= config.furthest_centre);
            assert!((layout.centre_z - spawn.z).abs() <= config.furthest_centre);
            assert!((config.min_radius..=config.max_radius).contains(&layout.radius));
            assert!((0.0..TAU).contains(&layout.start_angle));
        }
    }

    #[test]
    fn order_varies_between_events() {
        let config = PlacementConfig::default();
        let orders: std::collections::HashSet<Vec<TeamColour>> = (0..20)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                plan_circle(&TeamColour::ALL, Position::default(), &config, &mut rng)
                    .expect("plan")
                    .slots
                    .into_iter()
                    .map(|s| s.colour)
                    .collect()
            })
            .collect();
        assert!(orders.len() > 1);
    }

    #[test]
    fn deploy_records_home_current_and_in_world() {
        let f = fixture();
        let mut rng = StdRng::seed_from_u64(7);
        let placed = f
            .placer
            .deploy_all(WorldId::OVERWORLD, &[TeamColour::Red, TeamColour::Blue], &mut rng)
            .expect("deploy");

        assert_eq!(placed.len(), 2);
        for (colour, pos) in &placed {
            let state = f.placer.flag_state(*colour).expect("state");
            assert_eq!(state.home, *pos);
            assert_eq!(state.current.pos, *pos);
            assert_eq!(state.current.world, WorldId::OVERWORLD);
            assert!(state.in_world);
            assert_eq!(pos.y, GROUND);
            assert_eq!(f.world.block(WorldId::OVERWORLD, *pos), Block::Marker(*colour));
        }
    }

    #[test]
    fn return_home_after_take() {
        let f = fixture();
        let mut rng = StdRng::seed_from_u64(8);
        let placed = f
            .placer
            .deploy_all(WorldId::OVERWORLD, &[TeamColour::Red, TeamColour::Blue], &mut rng)
            .expect("deploy");
        let home = placed[&TeamColour::Red];

        f.placer.take(WorldId::OVERWORLD, home, TeamColour::Red).expect("take");
        assert!(!f.placer.flag_state(TeamColour::Red).expect("state").in_world);
        assert_eq!(f.world.block(WorldId::OVERWORLD, home), Block::Air);

        let back = f.placer.return_home(WorldId::OVERWORLD, TeamColour::Red).expect("return");
        assert_eq!(back, home);
        assert!(f.placer.flag_state(TeamColour::Red).expect("state").in_world);
    }

    #[test]
    fn remove_all_clears_markers_and_carriers() {
        let f = fixture();
        let mut rng = StdRng::seed_from_u64(9);
        f.placer
            .deploy_all(WorldId::OVERWORLD, &[TeamColour::Red, TeamColour::Blue], &mut rng)
            .expect("deploy");
        let online = PlayerId::new("alice");
        let offline = PlayerId::new("Big Steve");
        f.store.set_bool(&keys::has_flag(&online), true).expect("set");
        f.store.set_bool(&keys::has_flag(&offline), true).expect("set");

        assert_eq!(f.placer.remove_all().expect("remove"), 2);
        assert!(f.world.markers(WorldId::OVERWORLD).is_empty());
        assert!(!f.store.get_bool(&keys::has_flag(&online)).expect("get"));
        assert!(!f.store.get_bool(&keys::has_flag(&offline)).expect("get"));
        assert_eq!(f.placer.remove_all().expect("again"), 0);
    }

    #[test]
    fn dropped_flag_removed_from_its_own_world() {
        let f = fixture();
        let nether = WorldId(-1);
        let pos = f
            .placer
            .place_at(nether, Position::new(5, 100, 5), TeamColour::Green)
            .expect("place");
        assert_eq!(f.placer.flag_state(TeamColour::Green).expect("state").current.world, nether);

        f.placer.remove_all().expect("remove");
        assert_eq!(f.world.block(nether, pos), Block::Air);
    }
}
