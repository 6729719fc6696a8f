//! Online players.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::types::{Player, PlayerId, Position, WorldId};

/// Who is online and where they stand.
pub trait Roster: Send + Sync {
    /// Snapshots of every online player.
    fn online_players(&self) -> Vec<Player>;

    /// Snapshot of one player, if online.
    fn player(&self, id: &PlayerId) -> Option<Player> {
        self.online_players().into_iter().find(|p| &p.id == id)
    }
}

/// In-process [`Roster`] kept up to date by the host.
#[derive(Debug, Default)]
pub struct OnlinePlayers {
    players: RwLock<BTreeMap<PlayerId, Player>>,
}

impl OnlinePlayers {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a player online (or refresh their snapshot).
    pub fn login(&self, player: Player) {
        self.players.write().insert(player.id.clone(), player);
    }

    /// Mark a player offline.
    pub fn logout(&self, id: &PlayerId) -> Option<Player> {
        self.players.write().remove(id)
    }

    /// Update where an online player is. Ignored for offline players.
    pub fn move_to(&self, id: &PlayerId, world: WorldId, position: Position) {
        if let Some(player) = self.players.write().get_mut(id) {
            player.world = world;
            player.position = position;
        }
    }
}

impl Roster for OnlinePlayers {
    fn online_players(&self) -> Vec<Player> {
        self.players.read().values().cloned().collect()
    }

    fn player(&self, id: &PlayerId) -> Option<Player> {
        self.players.read().get(id).cloned()
    }
}
