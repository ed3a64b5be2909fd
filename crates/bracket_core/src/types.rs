//! Identifiers and small enums shared by every stage component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EngineError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifies one scheduling unit (a tournament stop).
    StageId
);
uuid_id!(RoundId);
uuid_id!(MatchId);
uuid_id!(GameId);

/// Caller-supplied identity of a team.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntrantId(pub String);

impl EntrantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntrantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntrantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for EntrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetitionMode {
    RoundRobin,
    SingleElimination,
    DoubleElimination,
}

impl CompetitionMode {
    pub fn is_elimination(self) -> bool {
        !matches!(self, CompetitionMode::RoundRobin)
    }
}

impl FromStr for CompetitionMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(|c: char| c == '-' || c == '_', "").as_str() {
            "roundrobin" | "rr" => Ok(CompetitionMode::RoundRobin),
            "singleelimination" | "single" | "se" => Ok(CompetitionMode::SingleElimination),
            "doubleelimination" | "double" | "de" => Ok(CompetitionMode::DoubleElimination),
            _ => Err(EngineError::Input(format!("unknown competition mode: {s}"))),
        }
    }
}

impl fmt::Display for CompetitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompetitionMode::RoundRobin => "round-robin",
            CompetitionMode::SingleElimination => "single-elimination",
            CompetitionMode::DoubleElimination => "double-elimination",
        };
        f.write_str(s)
    }
}

/// Which half of an elimination bracket a round belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BracketSide {
    Winner,
    Loser,
    Finals,
}

impl fmt::Display for BracketSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BracketSide::Winner => "WINNER",
            BracketSide::Loser => "LOSER",
            BracketSide::Finals => "FINALS",
        };
        f.write_str(s)
    }
}

/// Whether a downstream slot takes the winner or the loser of its source match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotRole {
    Winner,
    Loser,
}

/// One of the two slots of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// Discipline played in a game. `Tiebreaker` is the decider slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameSlot {
    MensDoubles,
    WomensDoubles,
    #[serde(rename = "MIXED_1")]
    Mixed1,
    #[serde(rename = "MIXED_2")]
    Mixed2,
    Tiebreaker,
}

impl GameSlot {
    pub const DISCIPLINES: [GameSlot; 4] = [
        GameSlot::MensDoubles,
        GameSlot::WomensDoubles,
        GameSlot::Mixed1,
        GameSlot::Mixed2,
    ];

    pub fn is_decider(self) -> bool {
        self == GameSlot::Tiebreaker
    }
}

impl FromStr for GameSlot {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "MENS_DOUBLES" | "MENS" => Ok(GameSlot::MensDoubles),
            "WOMENS_DOUBLES" | "WOMENS" => Ok(GameSlot::WomensDoubles),
            "MIXED_1" => Ok(GameSlot::Mixed1),
            "MIXED_2" => Ok(GameSlot::Mixed2),
            "TIEBREAKER" | "DECIDER" => Ok(GameSlot::Tiebreaker),
            _ => Err(EngineError::Input(format!("unknown game slot: {s}"))),
        }
    }
}

impl fmt::Display for GameSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameSlot::MensDoubles => "MENS_DOUBLES",
            GameSlot::WomensDoubles => "WOMENS_DOUBLES",
            GameSlot::Mixed1 => "MIXED_1",
            GameSlot::Mixed2 => "MIXED_2",
            GameSlot::Tiebreaker => "TIEBREAKER",
        };
        f.write_str(s)
    }
}

/// How a match came to be decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionMethod {
    Bye,
    Forfeit,
    Games,
    Decider,
    Points,
}
