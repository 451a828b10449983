//! Tournament model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{PlayerId, TournamentId};

/// Tournament format, which decides how standings are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TournamentFormat {
    SingleElimination,
    RoundRobin,
    /// Round-robin groups followed by a single-elimination playoff
    GroupStage,
}

impl std::fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentFormat::SingleElimination => write!(f, "single-elimination"),
            TournamentFormat::RoundRobin => write!(f, "round-robin"),
            TournamentFormat::GroupStage => write!(f, "group-stage"),
        }
    }
}

/// A group of a group-stage tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Display name (e.g. "Group A")
    pub name: String,

    /// Member player ids
    pub players: Vec<PlayerId>,
}

impl Group {
    pub fn new(name: &str, players: Vec<PlayerId>) -> Self {
        Self {
            name: name.to_string(),
            players,
        }
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.players.contains(&player_id)
    }
}

/// A tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,

    #[serde(default)]
    pub name: String,

    /// Date the tournament took place
    pub date: NaiveDate,

    pub format: TournamentFormat,

    /// Registered participants. Empty means "whoever appears in the matches".
    #[serde(default)]
    pub participants: Vec<PlayerId>,

    /// Group membership, for group-stage tournaments
    #[serde(default)]
    pub groups: Vec<Group>,

    /// How many players per group advance to the playoffs
    #[serde(default)]
    pub players_per_group_advance: Option<u32>,
}

impl Tournament {
    /// Create a new tournament with no roster.
    pub fn new(id: TournamentId, date: NaiveDate, format: TournamentFormat) -> Self {
        Self {
            id,
            name: String::new(),
            date,
            format,
            participants: Vec::new(),
            groups: Vec::new(),
            players_per_group_advance: None,
        }
    }

    /// Builder method to set the name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Builder method to set the participant roster.
    pub fn with_participants(mut self, participants: Vec<PlayerId>) -> Self {
        self.participants = participants;
        self
    }

    /// Builder method to set groups and the number advancing from each.
    /// Group members are added to the roster.
    pub fn with_groups(mut self, groups: Vec<Group>, advance: u32) -> Self {
        for group in &groups {
            for &player in &group.players {
                if !self.participants.contains(&player) {
                    self.participants.push(player);
                }
            }
        }
        self.groups = groups;
        self.players_per_group_advance = Some(advance);
        self
    }

    /// The group containing the given player, if any.
    pub fn group_of(&self, player_id: PlayerId) -> Option<&Group> {
        self.groups.iter().find(|g| g.contains(player_id))
    }
}
