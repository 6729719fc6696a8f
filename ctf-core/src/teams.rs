//! Team registry and scoring.
//!
//! Teams are owned by the host's scoreboard. The engine only needs to list
//! them, map them to and from colours, find a player's team and move points.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::colour::TeamColour;
use crate::types::{PlayerId, TeamId};

/// Scoreboard operations the engine depends on.
pub trait TeamRegistry: Send + Sync {
    /// All teams that currently have members.
    fn teams(&self) -> Vec<TeamId>;

    /// The team displayed in `colour`, if one exists.
    fn team_of(&self, colour: TeamColour) -> Option<TeamId>;

    /// The colour of `team`, if it has one.
    fn colour_of(&self, team: &TeamId) -> Option<TeamColour>;

    /// The team `player` belongs to.
    fn team_of_player(&self, player: &PlayerId) -> Option<TeamId>;

    /// Add `delta` (possibly negative) to the team's visible score.
    fn award_points(&self, team: &TeamId, delta: i32);

    /// Colours of every listed team, warning about teams without one.
    fn team_colours(&self) -> Vec<TeamColour> {
        let mut colours = Vec::new();
        for team in self.teams() {
            match self.colour_of(&team) {
                Some(colour) => colours.push(colour),
                None => warn!(%team, "Skipping team without a colour"),
            }
        }
        colours
    }
}

#[derive(Debug, Default)]
struct TeamEntry {
    colour: Option<TeamColour>,
    members: BTreeSet<PlayerId>,
    score: i64,
}

/// In-process [`TeamRegistry`].
#[derive(Debug, Default)]
pub struct Scoreboard {
    teams: RwLock<BTreeMap<TeamId, TeamEntry>>,
}

impl Scoreboard {
    /// Create an empty scoreboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or recolour) a team.
    pub fn add_team(&self, team: TeamId, colour: Option<TeamColour>) {
        self.teams.write().entry(team).or_default().colour = colour;
    }

    /// Put `player` on `team`, leaving any previous team. Creates the team
    /// without a colour if it does not exist.
    pub fn join(&self, player: PlayerId, team: &TeamId) {
        let mut teams = self.teams.write();
        for entry in teams.values_mut() {
            entry.members.remove(&player);
        }
        teams.entry(team.clone()).or_default().members.insert(player);
    }

    /// Remove `player` from whichever team they are on.
    pub fn leave(&self, player: &PlayerId) {
        for entry in self.teams.write().values_mut() {
            entry.members.remove(player);
        }
    }

    /// Current score of `team` (0 for unknown teams).
    #[must_use]
    pub fn score(&self, team: &TeamId) -> i64 {
        self.teams.read().get(team).map_or(0, |t| t.score)
    }

    /// Members of `team`.
    #[must_use]
    pub fn members(&self, team: &TeamId) -> Vec<PlayerId> {
        self.teams
            .read()
            .get(team)
            .map(|t| t.members.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl TeamRegistry for Scoreboard {
    fn teams(&self) -> Vec<TeamId> {
        self.teams
            .read()
            .iter()
            .filter(|(_, entry)| !entry.members.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn team_of(&self, colour: TeamColour) -> Option<TeamId> {
        self.teams
            .read()
            .iter()
            .find(|(_, entry)| entry.colour == Some(colour) && !entry.members.is_empty())
            .map(|(id, _)| id.clone())
    }

    fn colour_of(&self, team: &TeamId) -> Option<TeamColour> {
        self.teams.read().get(team).and_then(|t| t.colour)
    }

    fn team_of_player(&self, player: &PlayerId) -> Option<TeamId> {
        self.teams
            .read()
            .iter()
            .find(|(_, entry)| entry.members.contains(player))
            .map(|(id, _)| id.clone())
    }

    fn award_points(&self, team: &TeamId, delta: i32) {
        let mut teams = self.teams.write();
        let entry = teams.entry(team.clone()).or_default();
        entry.score += i64::from(delta);
        debug!(team = %team, delta, score = entry.score, "Points awarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Scoreboard {
        let board = Scoreboard::new();
        board.add_team(TeamId::new("reds"), Some(TeamColour::Red));
        board.add_team(TeamId::new("blues"), Some(TeamColour::Blue));
        board.join(PlayerId::new("alice"), &TeamId::new("reds"));
        board
    }

    #[test]
    fn only_teams_with_members_are_listed() {
        let board = board();
        assert_eq!(board.teams(), vec![TeamId::new("reds")]);
        assert_eq!(board.team_of(TeamColour::Blue), None);

        board.join(PlayerId::new("bob"), &TeamId::new("blues"));
        assert_eq!(board.teams().len(), 2);
        assert_eq!(board.team_of(TeamColour::Blue), Some(TeamId::new("blues")));
    }

    #[test]
    fn joining_moves_player_between_teams() {
        let board = board();
        board.join(PlayerId::new("alice"), &TeamId::new("blues"));
        assert_eq!(board.team_of_player(&PlayerId::new("alice")), Some(TeamId::new("blues")));
        assert!(board.members(&TeamId::new("reds")).is_empty());

        board.leave(&PlayerId::new("alice"));
        assert_eq!(board.team_of_player(&PlayerId::new("alice")), None);
    }

    #[test]
    fn points_can_go_negative() {
        let board = board();
        let reds = TeamId::new("reds");
        board.award_points(&reds, 20);
        board.award_points(&reds, -30);
        assert_eq!(board.score(&reds), -10);
    }

    #[test]
    fn colourless_teams_are_skipped_by_team_colours() {
        let board = board();
        board.join(PlayerId::new("carol"), &TeamId::new("spectators"));
        assert_eq!(board.teams().len(), 2);
        assert_eq!(board.team_colours(), vec![TeamColour::Red]);
    }
}
