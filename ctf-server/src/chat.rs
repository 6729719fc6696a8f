//! Chat fan-out for the headless host.
//!
//! Resolves team and global messages to the online players who should see
//! them and keeps a per-player inbox. A real game server would hand each
//! delivery to its network layer instead.

use std::collections::HashMap;
use std::sync::Arc;

use ctf_core::{Broadcaster, ChatMessage, OnlinePlayers, PlayerId, Roster, Scoreboard, TeamId};
use parking_lot::Mutex;
use tracing::debug;

/// [`Broadcaster`] that records every delivery per recipient.
#[derive(Debug)]
pub struct ChatLog {
    teams: Arc<Scoreboard>,
    roster: Arc<OnlinePlayers>,
    inboxes: Mutex<HashMap<PlayerId, Vec<ChatMessage>>>,
}

impl ChatLog {
    /// Deliver through `teams` and `roster`.
    #[must_use]
    pub fn new(teams: Arc<Scoreboard>, roster: Arc<OnlinePlayers>) -> Self {
        Self {
            teams,
            roster,
            inboxes: Mutex::new(HashMap::new()),
        }
    }

    /// Messages delivered to `player`, oldest first.
    #[must_use]
    pub fn inbox(&self, player: &PlayerId) -> Vec<ChatMessage> {
        self.inboxes.lock().get(player).cloned().unwrap_or_default()
    }

    /// Take and clear `player`'s messages.
    pub fn drain(&self, player: &PlayerId) -> Vec<ChatMessage> {
        self.inboxes.lock().remove(player).unwrap_or_default()
    }

    fn deliver(&self, recipients: impl IntoIterator<Item = PlayerId>, message: &ChatMessage) {
        let mut inboxes = self.inboxes.lock();
        for player in recipients {
            inboxes.entry(player).or_default().push(message.clone());
        }
    }
}

impl Broadcaster for ChatLog {
    fn tell(&self, player: &PlayerId, message: &ChatMessage) {
        debug!(%player, text = %message, "Chat");
        self.deliver([player.clone()], message);
    }

    fn tell_team(&self, team: &TeamId, message: &ChatMessage) {
        debug!(%team, text = %message, "Team chat");
        let online: Vec<_> = self
            .teams
            .members(team)
            .into_iter()
            .filter(|member| self.roster.player(member).is_some())
            .collect();
        self.deliver(online, message);
    }

    fn announce(&self, message: &ChatMessage) {
        debug!(text = %message, "Announcement");
        self.deliver(self.roster.online_players().into_iter().map(|p| p.id), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctf_core::messaging::format;
    use ctf_core::{Player, Position, TeamColour, WorldId};

    fn log() -> ChatLog {
        let teams = Arc::new(Scoreboard::new());
        let roster = Arc::new(OnlinePlayers::new());
        teams.add_team(TeamId::new("reds"), Some(TeamColour::Red));
        for name in ["alice", "bob"] {
            teams.join(PlayerId::new(name), &TeamId::new("reds"));
        }
        for name in ["alice", "carol"] {
            roster.login(Player::new(PlayerId::new(name), WorldId::OVERWORLD, Position::default()));
        }
        ChatLog::new(teams, roster)
    }

    #[test]
    fn team_messages_reach_online_members_only() {
        let log = log();
        let msg = format("hello", &[], TeamColour::Yellow);
        log.tell_team(&TeamId::new("reds"), &msg);
        assert_eq!(log.inbox(&PlayerId::new("alice")), vec![msg]);
        assert!(log.inbox(&PlayerId::new("bob")).is_empty());
        assert!(log.inbox(&PlayerId::new("carol")).is_empty());
    }

    #[test]
    fn announcements_reach_everyone_online() {
        let log = log();
        log.announce(&format("Capture the Flag has begun.", &[], TeamColour::Yellow));
        assert_eq!(log.drain(&PlayerId::new("carol")).len(), 1);
        assert!(log.inbox(&PlayerId::new("carol")).is_empty());
        assert_eq!(log.inbox(&PlayerId::new("alice")).len(), 1);
    }
}
