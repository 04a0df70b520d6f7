//! Shared game and settings types for cohstats.
//!
//! These types cross crate boundaries (log parser, refiner, overlay, CLI) and
//! are serialized into the settings store, so their serde representation is
//! part of the on-disk format.

pub mod formatting;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─────────────────────────────────────────────────────────────────────────────
// Match state
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of the game client as seen through its log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameState {
    #[default]
    Closed,
    Menu,
    Loading,
    InGame,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameState::Closed => "Closed",
            GameState::Menu => "Menu",
            GameState::Loading => "Loading",
            GameState::InGame => "InGame",
        };
        f.write_str(s)
    }
}

/// Classic means pvp axis vs allies, like automatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameType {
    Classic,
    AI,
    #[default]
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TeamSide {
    Axis,
    Allies,
    #[default]
    Mixed,
}

impl TeamSide {
    /// Lowercase form used by the coh3stats team APIs.
    pub fn api_name(self) -> &'static str {
        match self {
            TeamSide::Axis => "axis",
            TeamSide::Allies => "allies",
            TeamSide::Mixed => "mixed",
        }
    }
}

impl FromStr for TeamSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "axis" => Ok(TeamSide::Axis),
            "allies" => Ok(TeamSide::Allies),
            "mixed" => Ok(TeamSide::Mixed),
            _ => Err(format!("unknown side '{s}' (expected axis or allies)")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Factions
// ─────────────────────────────────────────────────────────────────────────────

/// Faction as it is written into the game log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Americans,
    BritishAfrica,
    Germans,
    AfrikaKorps,
    #[serde(other)]
    Unknown,
}

impl Faction {
    /// Parse the log-file token. Unrecognised tokens map to [`Faction::Unknown`].
    pub fn from_log(token: &str) -> Self {
        match token {
            "americans" => Faction::Americans,
            "british_africa" | "british" => Faction::BritishAfrica,
            "germans" => Faction::Germans,
            "afrika_korps" => Faction::AfrikaKorps,
            _ => Faction::Unknown,
        }
    }

    /// Leaderboard race for this faction.
    pub fn race(self) -> Option<Race> {
        match self {
            Faction::Americans => Some(Race::American),
            Faction::BritishAfrica => Some(Race::British),
            Faction::Germans => Some(Race::German),
            Faction::AfrikaKorps => Some(Race::Dak),
            Faction::Unknown => None,
        }
    }

    pub fn is_axis(self) -> bool {
        matches!(self, Faction::Germans | Faction::AfrikaKorps)
    }
}

/// Faction as the leaderboard API names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Race {
    American,
    British,
    Dak,
    German,
}

impl Race {
    pub const ALL: [Race; 4] = [Race::American, Race::British, Race::Dak, Race::German];
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Race::American => "american",
            Race::British => "british",
            Race::Dak => "dak",
            Race::German => "german",
        };
        f.write_str(s)
    }
}

impl FromStr for Race {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Race::ALL
            .into_iter()
            .find(|race| race.to_string() == lower)
            .ok_or_else(|| format!("unknown race '{s}'"))
    }
}

/// Ranked queue, derived from the size of one roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaderboardMode {
    #[serde(rename = "1v1")]
    OneVsOne,
    #[serde(rename = "2v2")]
    TwoVsTwo,
    #[serde(rename = "3v3")]
    ThreeVsThree,
    #[serde(rename = "4v4")]
    FourVsFour,
}

impl LeaderboardMode {
    pub const ALL: [LeaderboardMode; 4] = [
        LeaderboardMode::OneVsOne,
        LeaderboardMode::TwoVsTwo,
        LeaderboardMode::ThreeVsThree,
        LeaderboardMode::FourVsFour,
    ];

    pub fn from_team_size(players: usize) -> Option<Self> {
        match players {
            1 => Some(LeaderboardMode::OneVsOne),
            2 => Some(LeaderboardMode::TwoVsTwo),
            3 => Some(LeaderboardMode::ThreeVsThree),
            4 => Some(LeaderboardMode::FourVsFour),
            _ => None,
        }
    }
}

impl fmt::Display for LeaderboardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeaderboardMode::OneVsOne => "1v1",
            LeaderboardMode::TwoVsTwo => "2v2",
            LeaderboardMode::ThreeVsThree => "3v3",
            LeaderboardMode::FourVsFour => "4v4",
        };
        f.write_str(s)
    }
}

impl FromStr for LeaderboardMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeaderboardMode::ALL
            .into_iter()
            .find(|mode| mode.to_string() == s)
            .ok_or_else(|| format!("unknown mode '{s}' (expected 1v1, 2v2, 3v3 or 4v4)"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings values
// ─────────────────────────────────────────────────────────────────────────────

/// Which map image variant to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MapView {
    #[default]
    Default,
    Tm,
    Colored,
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_names_parse() {
        assert_eq!("2v2".parse::<LeaderboardMode>(), Ok(LeaderboardMode::TwoVsTwo));
        assert!("5v5".parse::<LeaderboardMode>().is_err());
        assert_eq!("DAK".parse::<Race>(), Ok(Race::Dak));
        assert_eq!("allies".parse::<TeamSide>(), Ok(TeamSide::Allies));
    }

    #[test]
    fn faction_tokens_map_to_races() {
        assert_eq!(Faction::from_log("americans").race(), Some(Race::American));
        assert_eq!(Faction::from_log("british_africa").race(), Some(Race::British));
        assert_eq!(Faction::from_log("germans").race(), Some(Race::German));
        assert_eq!(Faction::from_log("afrika_korps").race(), Some(Race::Dak));
        assert_eq!(Faction::from_log("soviet"), Faction::Unknown);
        assert!(Faction::AfrikaKorps.is_axis());
        assert!(!Faction::Americans.is_axis());
    }

    #[test]
    fn faction_serde_uses_log_tokens() {
        let json = serde_json::to_string(&Faction::BritishAfrica).unwrap();
        assert_eq!(json, "\"british_africa\"");
        let parsed: Faction = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(parsed, Faction::Unknown);
    }

    #[test]
    fn leaderboard_mode_from_team_size() {
        assert_eq!(LeaderboardMode::from_team_size(2), Some(LeaderboardMode::TwoVsTwo));
        assert_eq!(LeaderboardMode::from_team_size(0), None);
        assert_eq!(LeaderboardMode::from_team_size(5), None);
        assert_eq!(LeaderboardMode::FourVsFour.to_string(), "4v4");
    }

    #[test]
    fn map_view_roundtrips_lowercase() {
        assert_eq!(serde_json::to_string(&MapView::Tm).unwrap(), "\"tm\"");
        let parsed: MapView = serde_json::from_str("\"colored\"").unwrap();
        assert_eq!(parsed, MapView::Colored);
    }
}
