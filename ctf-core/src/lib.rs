//! # CTF Core Library
//!
//! Rules engine for server-wide capture-the-flag events in a block world.
//!
//! Each team gets one flag. An event runs through three phases:
//!
//! - **Preparation** — flags are spread around a random circle near spawn
//!   and each team learns where its own flag is
//! - **Active** — every flag is announced; players pick up enemy flags and
//!   carry them to their own flag to capture them for points
//! - **Inactive** — flags are removed and capture counts reset
//!
//! The engine owns no world, scoreboard or chat of its own. The host plugs
//! those in through [`Collaborators`]; in-process implementations of each
//! ([`VoxelWorld`], [`Scoreboard`], [`OnlinePlayers`], [`MemoryStore`],
//! [`SqliteStore`]) are included for headless servers and tests.
//!
//! ## Consistency
//!
//! Every engine entry point holds one lock for its whole duration, so
//! concurrent callbacks cannot double-count a capture or award points twice.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod colour;
pub mod config;
pub mod engine;
pub mod error;
pub mod keys;
pub mod messaging;
pub mod metrics;
pub mod placement;
pub mod roster;
pub mod store;
pub mod teams;
pub mod types;
pub mod world;

pub use colour::TeamColour;
pub use config::CtfConfig;
pub use engine::{Collaborators, DroppedFlag, FlagEventEngine, InteractOutcome, Rejection};
pub use error::{CtfError, Result};
pub use messaging::{Broadcaster, ChatMessage, Messenger};
pub use roster::{OnlinePlayers, Roster};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreExt};
pub use teams::{Scoreboard, TeamRegistry};
pub use types::*;
pub use world::{Block, MarkerWorld, VoxelWorld};
