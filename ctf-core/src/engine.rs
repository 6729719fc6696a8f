//! The flag event: phase state machine and player interaction rules.
//!
//! Every public entry point takes the engine lock for its whole duration, so
//! a pick-up, capture or drop observes and writes store state without
//! interleaving with any other callback. The same lock owns the placement
//! RNG.
//!
//! ```text
//!   Inactive ──prepare──▶ Preparation ──start──▶ Active
//!      ▲                                           │
//!      └──────────────────── stop ─────────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::colour::TeamColour;
use crate::config::{CtfConfig, RulesConfig};
use crate::error::Result;
use crate::keys;
use crate::messaging::{Broadcaster, Messenger};
use crate::metrics::CtfCounters;
use crate::placement::{FlagPlacer, FlagState};
use crate::roster::Roster;
use crate::store::{KeyValueStore, StoreExt};
use crate::teams::TeamRegistry;
use crate::types::{Phase, Player, PlayerId, Position, TeamId, WorldId, WorldPos};
use crate::world::MarkerWorld;

/// Host services the engine runs against.
#[derive(Clone)]
pub struct Collaborators {
    /// Persistent event state.
    pub store: Arc<dyn KeyValueStore>,
    /// Teams and scores.
    pub teams: Arc<dyn TeamRegistry>,
    /// Block world holding the markers.
    pub world: Arc<dyn MarkerWorld>,
    /// Online players.
    pub roster: Arc<dyn Roster>,
    /// Chat delivery.
    pub chat: Arc<dyn Broadcaster>,
}

/// Why an interaction was refused. No state is changed by a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The player is not on a team.
    NoTeam,
    /// The player's team has no flag colour.
    UnknownTeamColour,
    /// No team owns a flag of this colour.
    OrphanFlag(TeamColour),
    /// Enemy flag touched outside the active phase.
    NotStarted,
    /// The player already carries a flag.
    AlreadyCarrying,
    /// The team has captured this flag the maximum number of times.
    CaptureLimit {
        /// The configured limit.
        max: u32,
    },
    /// The touched flag is no longer in the world.
    FlagGone,
    /// Own flag touched without carrying an enemy flag.
    OwnFlag,
    /// A carried flag was brought home outside the active phase.
    EventOver,
}

impl Rejection {
    /// Text shown to the player.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NoTeam => "You must join a team to participate.".to_string(),
            Self::UnknownTeamColour => "Your team has no flag colour.".to_string(),
            Self::OrphanFlag(colour) => format!("No team owns the {colour} Flag."),
            Self::NotStarted => "You can't pick up any flags before the event starts.".to_string(),
            Self::AlreadyCarrying => "You can't carry multiple flags at once.".to_string(),
            Self::CaptureLimit { max } => format!(
                "Your team can't capture the same flag more than {max} {}.",
                if *max == 1 { "time" } else { "times" }
            ),
            Self::FlagGone => "That flag is no longer here.".to_string(),
            Self::OwnFlag => "You can't pick up your own flag.".to_string(),
            Self::EventOver => "You can't capture any flags after the event has ended.".to_string(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Result of a player touching a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractOutcome {
    /// An enemy flag was picked up.
    PickedUp,
    /// A carried flag was captured; `count` is the team's new total for it.
    Captured {
        /// Captures of this flag by this team so far in the event.
        count: i32,
    },
    /// The interaction was refused.
    Rejected(Rejection),
}

/// A flag put back into the world by a logout or death.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedFlag {
    /// Colour of the dropped flag.
    pub colour: TeamColour,
    /// Where the marker was placed.
    pub at: WorldPos,
}

/// Runs capture-the-flag events against the host's collaborators.
pub struct FlagEventEngine {
    store: Arc<dyn KeyValueStore>,
    teams: Arc<dyn TeamRegistry>,
    roster: Arc<dyn Roster>,
    placer: FlagPlacer,
    chat: Messenger,
    rules: RulesConfig,
    lock: Mutex<StdRng>,
    counters: CtfCounters,
}

impl fmt::Debug for FlagEventEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagEventEngine")
            .field("rules", &self.rules)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl FlagEventEngine {
    /// Create an engine with an entropy-seeded RNG.
    #[must_use]
    pub fn new(config: &CtfConfig, collaborators: Collaborators) -> Self {
        Self::with_rng(config, collaborators, StdRng::from_entropy())
    }

    /// Create an engine whose flag layouts are reproducible.
    #[must_use]
    pub fn with_seed(config: &CtfConfig, collaborators: Collaborators, seed: u64) -> Self {
        Self::with_rng(config, collaborators, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &CtfConfig, c: Collaborators, rng: StdRng) -> Self {
        let placer = FlagPlacer::new(c.store.clone(), c.world, config.placement.clone());
        Self {
            store: c.store,
            teams: c.teams,
            roster: c.roster,
            placer,
            chat: Messenger::new(c.chat),
            rules: config.rules.clone(),
            lock: Mutex::new(rng),
            counters: CtfCounters::new(),
        }
    }

    /// Event counters since construction.
    #[must_use]
    pub fn counters(&self) -> &CtfCounters {
        &self.counters
    }

    /// Rules in effect.
    #[must_use]
    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    // ---- Phases ----

    /// The current phase.
    ///
    /// # Errors
    /// Returns a store failure.
    pub fn phase(&self) -> Result<Phase> {
        let _guard = self.lock.lock();
        self.read_phase()
    }

    /// Deploy flags and tell each team where its own flag is.
    ///
    /// Valid in any phase. Outside the inactive phase the current markers and
    /// carried flags are cleared first and every flag gets a fresh home;
    /// capture counts and the active flag are left alone.
    ///
    /// # Errors
    /// [`CtfError::NoTeams`](crate::CtfError::NoTeams) if no team has a
    /// colour, or a placement / store failure. The phase is unchanged on
    /// failure.
    pub fn prepare(&self) -> Result<()> {
        let mut rng = self.lock.lock();
        let phase = self.read_phase()?;
        if phase != Phase::Inactive {
            let removed = self.placer.remove_all()?;
            info!(%phase, removed, "Redeploying flags");
        }
        self.prepare_locked(&mut rng)
    }

    /// Announce every flag and enable capturing.
    /// Does nothing outside the preparation phase.
    ///
    /// # Errors
    /// Returns a store failure.
    pub fn start(&self) -> Result<()> {
        let _guard = self.lock.lock();
        match self.read_phase()? {
            Phase::Preparation => self.start_locked(),
            phase => {
                warn!(%phase, "Ignoring start outside the preparation phase");
                Ok(())
            }
        }
    }

    /// Remove all flags, reset capture counts and end the event. Safe to call
    /// in any phase.
    ///
    /// # Errors
    /// Returns a store failure.
    pub fn stop(&self) -> Result<()> {
        let _guard = self.lock.lock();
        self.stop_locked()
    }

    /// Advance to the next phase and return it.
    ///
    /// # Errors
    /// Returns the failure of the transition performed; the phase is then
    /// unchanged.
    pub fn cycle(&self) -> Result<Phase> {
        let mut rng = self.lock.lock();
        let from = self.read_phase()?;
        match from {
            Phase::Inactive => self.prepare_locked(&mut rng)?,
            Phase::Preparation => self.start_locked()?,
            Phase::Active => self.stop_locked()?,
        }
        Ok(from.next())
    }

    fn read_phase(&self) -> Result<Phase> {
        Ok(Phase::from_flags(
            self.store.get_bool(&keys::flags_prepared())?,
            self.store.get_bool(&keys::flags_active())?,
        ))
    }

    fn prepare_locked(&self, rng: &mut StdRng) -> Result<()> {
        let placed = self
            .placer
            .deploy_all(WorldId::OVERWORLD, &self.teams.team_colours(), rng)?;
        CtfCounters::bump(&self.counters.flags_deployed, placed.len() as u64);

        for team in self.teams.teams() {
            let Some(colour) = self.teams.colour_of(&team) else {
                continue;
            };
            if let Some(pos) = placed.get(&colour) {
                self.chat
                    .tell_team(&team, &format!("Your flag has been deployed at {pos}."), &[]);
            }
        }

        self.store.set_bool(&keys::flags_prepared(), true)?;
        self.chat.announce("Capture the Flag will begin soon.", &[]);
        CtfCounters::bump(&self.counters.phase_transitions, 1);
        info!(flags = placed.len(), "Capture the Flag prepared");
        Ok(())
    }

    fn start_locked(&self) -> Result<()> {
        for colour in self.teams.team_colours() {
            let pos = self.store.get_position(&keys::flag_position(colour))?;
            self.chat.announce(
                &format!("The &{colour} Flag& has been discovered at {pos}."),
                &[colour],
            );
        }

        self.store.set_bool(&keys::flags_active(), true)?;
        self.chat.announce("Capture the Flag has begun.", &[]);
        CtfCounters::bump(&self.counters.phase_transitions, 1);
        info!("Capture the Flag started");
        Ok(())
    }

    fn stop_locked(&self) -> Result<()> {
        let removed = self.placer.remove_all()?;

        for capturing in TeamColour::ALL {
            for captured in TeamColour::ALL {
                if capturing != captured {
                    self.store
                        .set_int(&keys::num_captures(capturing, captured), 0)?;
                }
            }
        }

        self.store.set_bool(&keys::flags_prepared(), false)?;
        self.store.set_bool(&keys::flags_active(), false)?;
        self.chat.announce("Capture the Flag has ended.", &[]);
        CtfCounters::bump(&self.counters.phase_transitions, 1);
        info!(removed, "Capture the Flag ended");
        Ok(())
    }

    // ---- Interactions ----

    /// A player touched the `flag` marker at `pos` in `world`.
    ///
    /// # Errors
    /// Returns a placement or store failure. Rule violations are reported as
    /// [`InteractOutcome::Rejected`].
    pub fn interact(
        &self,
        flag: TeamColour,
        player: &Player,
        world: WorldId,
        pos: Position,
    ) -> Result<InteractOutcome> {
        let _guard = self.lock.lock();

        let Some(team) = self.teams.team_of_player(&player.id) else {
            return Ok(self.reject(&player.id, Rejection::NoTeam));
        };
        let Some(colour) = self.teams.colour_of(&team) else {
            warn!(player = %player.id, %team, "Player's team has no colour");
            return Ok(self.reject(&player.id, Rejection::UnknownTeamColour));
        };
        if self.teams.team_of(flag).is_none() {
            warn!(%flag, "Flag has no owning team");
            return Ok(self.reject(&player.id, Rejection::OrphanFlag(flag)));
        }

        if flag == colour {
            self.interact_own(player, &team, colour)
        } else {
            self.interact_enemy(flag, player, colour, world, pos)
        }
    }

    fn interact_enemy(
        &self,
        flag: TeamColour,
        player: &Player,
        colour: TeamColour,
        world: WorldId,
        pos: Position,
    ) -> Result<InteractOutcome> {
        let id = &player.id;
        if !self.store.get_bool(&keys::flags_active())? {
            return Ok(self.reject(id, Rejection::NotStarted));
        }
        if self.store.get_bool(&keys::has_flag(id))? {
            return Ok(self.reject(id, Rejection::AlreadyCarrying));
        }
        let captures = self.store.get_int(&keys::num_captures(colour, flag))?;
        if i64::from(captures) >= i64::from(self.rules.max_captures) {
            let max = self.rules.max_captures;
            return Ok(self.reject(id, Rejection::CaptureLimit { max }));
        }
        if !self.store.get_bool(&keys::flag_in_world(flag))? {
            return Ok(self.reject(id, Rejection::FlagGone));
        }

        self.store.set_enum(&keys::held_flag(id), flag)?;
        self.store.set_bool(&keys::has_flag(id), true)?;
        self.placer.take(world, pos, flag)?;

        self.chat.announce(
            &format!("&{id}& has picked up the &{flag} Flag&."),
            &[colour, flag],
        );
        CtfCounters::bump(&self.counters.pickups, 1);
        info!(player = %id, %flag, "Flag picked up");
        Ok(InteractOutcome::PickedUp)
    }

    fn interact_own(
        &self,
        player: &Player,
        team: &TeamId,
        colour: TeamColour,
    ) -> Result<InteractOutcome> {
        let id = &player.id;
        if !self.store.get_bool(&keys::has_flag(id))? {
            return Ok(self.reject(id, Rejection::OwnFlag));
        }
        if !self.store.get_bool(&keys::flags_active())? {
            return Ok(self.reject(id, Rejection::EventOver));
        }
        if !self.store.get_bool(&keys::flag_in_world(colour))? {
            return Ok(self.reject(id, Rejection::FlagGone));
        }

        let captured: TeamColour = self.store.get_enum(&keys::held_flag(id))?;
        let returned = self.placer.return_home(WorldId::OVERWORLD, captured)?;
        self.store.set_bool(&keys::has_flag(id), false)?;
        let count = self
            .store
            .increment(&keys::num_captures(colour, captured), 1)?;

        let max = self.rules.max_captures;
        self.chat.announce(
            &format!("&{id}& has captured the &{captured} Flag& ({count}/{max})."),
            &[colour, captured],
        );
        self.chat.announce(
            &format!("The &{captured} Flag& has been returned to &{returned}&."),
            &[captured, TeamColour::Cyan],
        );

        let reward = self.rules.capture_reward;
        self.chat.tell_team(
            team,
            &format!("Your team has been awarded &{reward}& points."),
            &[TeamColour::White],
        );
        self.teams.award_points(team, reward);

        match self.teams.team_of(captured) {
            Some(victim) => {
                let penalty = self.rules.capture_penalty;
                self.chat.tell_team(
                    &victim,
                    &format!("Your team has lost &{penalty}& points."),
                    &[TeamColour::White],
                );
                self.teams.award_points(&victim, penalty.saturating_neg());
            }
            None => warn!(%captured, "Captured flag has no owning team, penalty skipped"),
        }

        CtfCounters::bump(&self.counters.captures, 1);
        info!(player = %id, team = %team, %captured, count, "Flag captured");
        Ok(InteractOutcome::Captured { count })
    }

    fn reject(&self, player: &PlayerId, rejection: Rejection) -> InteractOutcome {
        debug!(%player, ?rejection, "Interaction rejected");
        self.chat.tell(player, &rejection.message(), &[]);
        CtfCounters::bump(&self.counters.rejections, 1);
        InteractOutcome::Rejected(rejection)
    }

    /// Put the player's carried flag down where they stand. Returns `None`
    /// if they carry nothing.
    ///
    /// # Errors
    /// Returns a placement or store failure; the player keeps the flag.
    pub fn drop_flag(&self, player: &Player) -> Result<Option<DroppedFlag>> {
        let _guard = self.lock.lock();
        let id = &player.id;
        if !self.store.get_bool(&keys::has_flag(id))? {
            return Ok(None);
        }

        let flag: TeamColour = self.store.get_enum(&keys::held_flag(id))?;
        let pos = self.placer.place_at(player.world, player.position, flag)?;
        self.store.set_bool(&keys::has_flag(id), false)?;

        let at = WorldPos {
            pos,
            world: player.world,
        };
        let colour = self.colour_of_player(id).unwrap_or(TeamColour::Yellow);
        self.chat.announce(
            &format!("&{id}& has dropped the &{flag} Flag& at {at}."),
            &[colour, flag],
        );
        CtfCounters::bump(&self.counters.drops, 1);
        info!(player = %id, %flag, %at, "Flag dropped");
        Ok(Some(DroppedFlag { colour: flag, at }))
    }

    /// Tell a newly connected player where the flags are.
    ///
    /// # Errors
    /// Returns a store failure.
    pub fn on_join(&self, player: &Player) -> Result<()> {
        let _guard = self.lock.lock();
        let id = &player.id;

        match self.read_phase()? {
            Phase::Active => {
                for colour in self.teams.team_colours() {
                    let state = self.placer.flag_state(colour)?;
                    if state.in_world {
                        self.chat.tell(
                            id,
                            &format!("The &{colour} Flag& is located at {}.", state.current),
                            &[colour],
                        );
                    }
                }

                for carrier in self.roster.online_players() {
                    if !self.store.get_bool(&keys::has_flag(&carrier.id))? {
                        continue;
                    }
                    let held: TeamColour = self.store.get_enum(&keys::held_flag(&carrier.id))?;
                    let colour = self.colour_of_player(&carrier.id).unwrap_or(TeamColour::Yellow);
                    self.chat.tell(
                        id,
                        &format!(
                            "The &{held} Flag& is held by &{}& at {}.",
                            carrier.id,
                            carrier.world_pos()
                        ),
                        &[held, colour],
                    );
                }
            }
            Phase::Preparation => {
                if let Some(colour) = self.colour_of_player(id) {
                    let pos = self.store.get_position(&keys::flag_position(colour))?;
                    self.chat
                        .tell(id, &format!("Your flag is located at {pos}."), &[]);
                }
            }
            Phase::Inactive => {}
        }
        Ok(())
    }

    /// A player disconnected; drops any carried flag.
    ///
    /// # Errors
    /// See [`FlagEventEngine::drop_flag`].
    pub fn on_leave(&self, player: &Player) -> Result<Option<DroppedFlag>> {
        self.drop_flag(player)
    }

    /// A player died; drops any carried flag.
    ///
    /// # Errors
    /// See [`FlagEventEngine::drop_flag`].
    pub fn on_death(&self, player: &Player) -> Result<Option<DroppedFlag>> {
        self.drop_flag(player)
    }

    // ---- Queries ----

    /// Persisted state of one flag.
    ///
    /// # Errors
    /// Returns a store failure.
    pub fn flag_state(&self, colour: TeamColour) -> Result<FlagState> {
        let _guard = self.lock.lock();
        self.placer.flag_state(colour)
    }

    /// Colour of the flag `player` carries, if any.
    ///
    /// # Errors
    /// Returns a store failure.
    pub fn carried_flag(&self, player: &PlayerId) -> Result<Option<TeamColour>> {
        let _guard = self.lock.lock();
        if self.store.get_bool(&keys::has_flag(player))? {
            Ok(Some(self.store.get_enum(&keys::held_flag(player))?))
        } else {
            Ok(None)
        }
    }

    /// Times `capturing` has captured `captured`'s flag this event.
    ///
    /// # Errors
    /// Returns a store failure.
    pub fn captures(&self, capturing: TeamColour, captured: TeamColour) -> Result<i32> {
        self.store.get_int(&keys::num_captures(capturing, captured))
    }

    fn colour_of_player(&self, player: &PlayerId) -> Option<TeamColour> {
        self.teams
            .team_of_player(player)
            .and_then(|team| self.teams.colour_of(&team))
    }
}
