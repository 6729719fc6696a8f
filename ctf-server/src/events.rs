//! Host events dispatched to the engine.
//!
//! The game server translates its own callbacks (connections, deaths, block
//! clicks, chat commands) into these and feeds them to
//! [`CtfServer::handle`](crate::CtfServer::handle).

use ctf_core::{
    DroppedFlag, InteractOutcome, Phase, Player, PlayerId, Position, TeamColour, WorldId,
};

/// Something that happened on the game server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A player connected.
    Login(Player),

    /// A player disconnected.
    Logout(PlayerId),

    /// A player died where they last stood.
    Death(PlayerId),

    /// A player moved.
    Moved {
        player: PlayerId,
        world: WorldId,
        position: Position,
    },

    /// A player clicked a flag marker.
    FlagClicked {
        player: PlayerId,
        colour: TeamColour,
        world: WorldId,
        position: Position,
    },

    /// A player ran the `ctf` command.
    Command {
        sender: PlayerId,
        permission_level: u8,
    },
}

impl ServerEvent {
    /// The player the event concerns.
    #[must_use]
    pub fn player(&self) -> &PlayerId {
        match self {
            Self::Login(player) => &player.id,
            Self::Logout(player)
            | Self::Death(player)
            | Self::Moved { player, .. }
            | Self::FlagClicked { player, .. } => player,
            Self::Command { sender, .. } => sender,
        }
    }
}

/// What handling an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Nothing for the engine to do.
    Ignored,
    /// The joining player was briefed.
    Joined,
    /// A flag click was resolved.
    Interacted(InteractOutcome),
    /// A disconnect or death was processed; carries the dropped flag, if any.
    Dropped(Option<DroppedFlag>),
    /// The command moved the event to this phase.
    PhaseChanged(Phase),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_is_extracted_from_every_variant() {
        let id = PlayerId::new("alice");
        let events = [
            ServerEvent::Login(Player::new(id.clone(), WorldId::OVERWORLD, Position::default())),
            ServerEvent::Logout(id.clone()),
            ServerEvent::Death(id.clone()),
            ServerEvent::Moved {
                player: id.clone(),
                world: WorldId(1),
                position: Position::default(),
            },
            ServerEvent::FlagClicked {
                player: id.clone(),
                colour: TeamColour::Red,
                world: WorldId::OVERWORLD,
                position: Position::default(),
            },
            ServerEvent::Command {
                sender: id.clone(),
                permission_level: 4,
            },
        ];
        for event in &events {
            assert_eq!(event.player(), &id);
        }
    }
}
