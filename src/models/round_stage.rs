//! Bracket stage of a match.

use serde::{Deserialize, Serialize};

/// Stage of a tournament a match belongs to, with a chronological rank.
///
/// Within one tournament date, later stages happen later in real time, so
/// the rank is used as the second key of the chronological ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundStage {
    /// Legacy or free-form label that matched no known stage
    #[default]
    Unclassified,
    /// Group or round-robin stage
    Group,
    #[serde(rename = "round_of_16")]
    RoundOf16,
    Quarterfinal,
    Semifinal,
    ThirdPlace,
    Final,
}

impl RoundStage {
    /// Chronological rank: unclassified sorts first, the final last.
    pub fn rank(&self) -> u8 {
        match self {
            RoundStage::Unclassified => 0,
            RoundStage::Group => 1,
            RoundStage::RoundOf16 => 2,
            RoundStage::Quarterfinal => 3,
            RoundStage::Semifinal => 4,
            RoundStage::ThirdPlace => 5,
            RoundStage::Final => 6,
        }
    }

    /// Classify a free-text round label ("Quarterfinal", "Group A", ...).
    ///
    /// Matching is case-insensitive and by substring. The more specific
    /// patterns are checked first because "semifinal" and "quarterfinal"
    /// both contain "final". Consolation games are not bracket rounds and
    /// stay unclassified.
    pub fn classify(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            return RoundStage::Unclassified;
        }

        if label.contains("third") || label.contains("3rd") || label.contains("bronze") {
            RoundStage::ThirdPlace
        } else if label.contains("consolation") {
            RoundStage::Unclassified
        } else if label.contains("semi") {
            RoundStage::Semifinal
        } else if label.contains("quarter") {
            RoundStage::Quarterfinal
        } else if label.contains("round of 16")
            || label.contains("last 16")
            || label.contains("1/8")
            || label.contains("r16")
        {
            RoundStage::RoundOf16
        } else if label.contains("group")
            || label.contains("round robin")
            || label.contains("round-robin")
        {
            RoundStage::Group
        } else if label.contains("final") {
            RoundStage::Final
        } else {
            RoundStage::Unclassified
        }
    }

    /// Whether this is a knockout (playoff) stage.
    pub fn is_knockout(&self) -> bool {
        matches!(
            self,
            RoundStage::RoundOf16
                | RoundStage::Quarterfinal
                | RoundStage::Semifinal
                | RoundStage::ThirdPlace
                | RoundStage::Final
        )
    }

    /// Rounds remaining before the final (final = 0), for stages that pin
    /// down a bracket depth. The third-place match has no depth of its own.
    pub fn elimination_depth(&self) -> Option<u32> {
        match self {
            RoundStage::Final => Some(0),
            RoundStage::Semifinal => Some(1),
            RoundStage::Quarterfinal => Some(2),
            RoundStage::RoundOf16 => Some(3),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoundStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundStage::Unclassified => write!(f, "unclassified"),
            RoundStage::Group => write!(f, "group"),
            RoundStage::RoundOf16 => write!(f, "round_of_16"),
            RoundStage::Quarterfinal => write!(f, "quarterfinal"),
            RoundStage::Semifinal => write!(f, "semifinal"),
            RoundStage::ThirdPlace => write!(f, "third_place"),
            RoundStage::Final => write!(f, "final"),
        }
    }
}
