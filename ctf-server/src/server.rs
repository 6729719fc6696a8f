//! A headless capture-the-flag host.
//!
//! Wires the engine to a SQLite store, an in-process scoreboard, roster and
//! block world, and the chat log, then feeds it [`ServerEvent`]s.

use std::sync::Arc;

use ctf_core::{
    Collaborators, CtfConfig, FlagEventEngine, OnlinePlayers, Result, Roster, Scoreboard,
    SqliteStore, VoxelWorld,
};
use tracing::{info, warn};

use crate::chat::ChatLog;
use crate::command::CtfCommand;
use crate::events::{EventOutcome, ServerEvent};

/// Everything a running server owns.
#[derive(Debug)]
pub struct CtfServer {
    config: CtfConfig,
    store: Arc<SqliteStore>,
    teams: Arc<Scoreboard>,
    roster: Arc<OnlinePlayers>,
    world: Arc<VoxelWorld>,
    chat: Arc<ChatLog>,
    engine: FlagEventEngine,
    command: CtfCommand,
}

impl CtfServer {
    /// Open the database at `config.persistence.path` and build the server.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn open(config: CtfConfig, world: VoxelWorld) -> Result<Self> {
        let store = SqliteStore::open(&config.persistence.path, &config.persistence)?;
        info!(path = %config.persistence.path.display(), "CTF server store opened");
        Ok(Self::with_store(config, world, store, None))
    }

    /// Build a server over an in-memory database with reproducible flag
    /// layouts.
    ///
    /// # Errors
    /// Returns an error if the database cannot be created.
    pub fn in_memory(config: CtfConfig, world: VoxelWorld, seed: u64) -> Result<Self> {
        let store = SqliteStore::open_in_memory(&config.persistence)?;
        Ok(Self::with_store(config, world, store, Some(seed)))
    }

    fn with_store(
        config: CtfConfig,
        world: VoxelWorld,
        store: SqliteStore,
        seed: Option<u64>,
    ) -> Self {
        let store = Arc::new(store);
        let teams = Arc::new(Scoreboard::new());
        let roster = Arc::new(OnlinePlayers::new());
        let world = Arc::new(world);
        let chat = Arc::new(ChatLog::new(teams.clone(), roster.clone()));

        let collaborators = Collaborators {
            store: store.clone(),
            teams: teams.clone(),
            world: world.clone(),
            roster: roster.clone(),
            chat: chat.clone(),
        };
        let engine = match seed {
            Some(seed) => FlagEventEngine::with_seed(&config, collaborators, seed),
            None => FlagEventEngine::new(&config, collaborators),
        };
        let command = CtfCommand::new(config.server.command_permission_level);

        Self {
            config,
            store,
            teams,
            roster,
            world,
            chat,
            engine,
            command,
        }
    }

    /// Dispatch one host event.
    ///
    /// # Errors
    /// Returns engine failures and
    /// [`CtfError::PermissionDenied`](ctf_core::CtfError::PermissionDenied)
    /// for unprivileged commands.
    pub fn handle(&self, event: ServerEvent) -> Result<EventOutcome> {
        match event {
            ServerEvent::Login(player) => {
                self.roster.login(player.clone());
                self.engine.on_join(&player)?;
                Ok(EventOutcome::Joined)
            }
            ServerEvent::Logout(id) => match self.roster.player(&id) {
                Some(player) => {
                    // A failed drop keeps the carrier online so it can be retried.
                    let dropped = self.engine.on_leave(&player)?;
                    self.roster.logout(&id);
                    Ok(EventOutcome::Dropped(dropped))
                }
                None => {
                    warn!(player = %id, "Logout for a player who is not online");
                    Ok(EventOutcome::Ignored)
                }
            },
            ServerEvent::Death(id) => match self.roster.player(&id) {
                Some(player) => Ok(EventOutcome::Dropped(self.engine.on_death(&player)?)),
                None => Ok(EventOutcome::Ignored),
            },
            ServerEvent::Moved {
                player,
                world,
                position,
            } => {
                self.roster.move_to(&player, world, position);
                Ok(EventOutcome::Ignored)
            }
            ServerEvent::FlagClicked {
                player,
                colour,
                world,
                position,
            } => match self.roster.player(&player) {
                Some(player) => Ok(EventOutcome::Interacted(
                    self.engine.interact(colour, &player, world, position)?,
                )),
                None => {
                    warn!(%player, %colour, "Flag click from a player who is not online");
                    Ok(EventOutcome::Ignored)
                }
            },
            ServerEvent::Command {
                sender,
                permission_level,
            } => {
                let phase = self
                    .command
                    .execute(&self.engine, sender.name(), permission_level)?;
                Ok(EventOutcome::PhaseChanged(phase))
            }
        }
    }

    /// Verify the database and take a rotating backup.
    ///
    /// # Errors
    /// Returns an error if the check or backup fails.
    pub fn maintain(&self) -> Result<bool> {
        let healthy = self.store.integrity_check()?;
        if healthy {
            self.store.create_rotating_backup()?;
        } else {
            warn!("Integrity check failed, backup skipped");
        }
        Ok(healthy)
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &CtfConfig {
        &self.config
    }

    /// The rules engine.
    #[must_use]
    pub fn engine(&self) -> &FlagEventEngine {
        &self.engine
    }

    /// Teams and scores.
    #[must_use]
    pub fn teams(&self) -> &Scoreboard {
        &self.teams
    }

    /// Online players.
    #[must_use]
    pub fn roster(&self) -> &OnlinePlayers {
        &self.roster
    }

    /// The block world.
    #[must_use]
    pub fn world(&self) -> &VoxelWorld {
        &self.world
    }

    /// Delivered chat.
    #[must_use]
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }
}
