//! # ctf-server — Headless Host for ctf-core
//!
//! This crate runs the `ctf-core` rules engine without a game client:
//! it owns a SQLite store, an in-process scoreboard, roster and block world,
//! and turns host callbacks into engine calls.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              Game server                 │
//! │   login · logout · death · click · /ctf  │
//! │                   │                      │
//! │                   ▼ ServerEvent          │
//! │  ┌────────────────────────────────────┐  │
//! │  │            CtfServer               │  │
//! │  │  ┌──────────┐  ┌────────────────┐  │  │
//! │  │  │CtfCommand│  │    ChatLog     │  │  │
//! │  │  └────┬─────┘  └───────▲────────┘  │  │
//! │  │       ▼                │           │  │
//! │  │  ┌─────────────────────┴────────┐  │  │
//! │  │  │  ctf-core FlagEventEngine    │  │  │
//! │  │  └──────────────────────────────┘  │  │
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `events` — host events and what handling them did
//! - `server` — composition and dispatch
//! - `command` — the permission-checked `ctf` phase command
//! - `chat` — per-player delivery of engine messages
//! - `logging` — `tracing-subscriber` setup

pub mod chat;
pub mod command;
pub mod events;
pub mod logging;
pub mod server;

pub use chat::ChatLog;
pub use command::CtfCommand;
pub use events::{EventOutcome, ServerEvent};
pub use logging::init_logging;
pub use server::CtfServer;
