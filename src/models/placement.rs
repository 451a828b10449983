//! Tournament placement and standings model.

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// Where a player finished in a tournament.
///
/// Serialized as a string: `"1"`, `"3-4"` or `"group-stage"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Placement {
    /// A single rank (1 = winner)
    Rank(u32),
    /// A shared span of ranks, e.g. both semifinal losers at 3-4
    Range(u32, u32),
    /// Did not advance past the group stage
    GroupStage,
}

impl Placement {
    /// Placement for a tier of `len` players starting at `start`.
    pub fn span(start: u32, len: u32) -> Self {
        if len <= 1 {
            Placement::Rank(start)
        } else {
            Placement::Range(start, start + len - 1)
        }
    }

    /// Best rank covered, if numeric.
    pub fn low(&self) -> Option<u32> {
        match self {
            Placement::Rank(r) => Some(*r),
            Placement::Range(low, _) => Some(*low),
            Placement::GroupStage => None,
        }
    }

    /// Worst rank covered, if numeric.
    pub fn high(&self) -> Option<u32> {
        match self {
            Placement::Rank(r) => Some(*r),
            Placement::Range(_, high) => Some(*high),
            Placement::GroupStage => None,
        }
    }

    pub fn is_winner(&self) -> bool {
        matches!(self, Placement::Rank(1))
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Placement::Rank(r) => write!(f, "{}", r),
            Placement::Range(low, high) => write!(f, "{}-{}", low, high),
            Placement::GroupStage => write!(f, "group-stage"),
        }
    }
}

impl From<Placement> for String {
    fn from(p: Placement) -> Self {
        p.to_string()
    }
}

impl TryFrom<String> for Placement {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let s = s.trim();
        if s == "group-stage" {
            return Ok(Placement::GroupStage);
        }

        let parse = |n: &str| {
            n.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid placement: {:?}", s))
        };

        match s.split_once('-') {
            Some((low, high)) => {
                let (low, high) = (parse(low)?, parse(high)?);
                if low > high {
                    return Err(format!("invalid placement range: {:?}", s));
                }
                Ok(Placement::span(low, high - low + 1))
            }
            None => Ok(Placement::Rank(parse(s)?)),
        }
    }
}

/// A player's row in a tournament's standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player_id: PlayerId,
    pub placement: Placement,
    pub wins: u32,
    pub losses: u32,
    /// Own scores minus opponents' scores
    pub point_difference: i64,
    /// Percentage, two decimals
    pub win_rate: f64,
    pub points: u32,
}
