use cohstats_types::{Faction, GameState, GameType, TeamSide};
use serde::{Deserialize, Serialize};

/// Relic id the log uses for AI slots.
pub const AI_RELIC_ID: &str = "-1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPlayer {
    pub ai: bool,
    pub faction: Faction,
    pub relic_id: String,
    pub name: String,
    pub position: u8,
}

impl RawPlayer {
    pub fn human(position: u8, name: &str, relic_id: &str, faction: Faction) -> Self {
        Self {
            ai: false,
            faction,
            relic_id: relic_id.to_string(),
            name: name.to_string(),
            position,
        }
    }

    pub fn ai(position: u8, name: &str, faction: Faction) -> Self {
        Self {
            ai: true,
            faction,
            relic_id: AI_RELIC_ID.to_string(),
            name: name.to_string(),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RawTeam {
    pub players: Vec<RawPlayer>,
    pub side: TeamSide,
}

impl RawTeam {
    /// Build a roster, deriving its side from the factions in it.
    ///
    /// A roster mixing axis and allied factions is `Mixed`, as is an empty
    /// one or one with any unrecognised faction.
    pub fn from_players(players: Vec<RawPlayer>) -> Self {
        let side = if players.is_empty() || players.iter().any(|p| p.faction == Faction::Unknown)
        {
            TeamSide::Mixed
        } else if players.iter().all(|p| p.faction.is_axis()) {
            TeamSide::Axis
        } else if players.iter().all(|p| !p.faction.is_axis()) {
            TeamSide::Allies
        } else {
            TeamSide::Mixed
        };
        Self { players, side }
    }

    pub fn ai_count(&self) -> usize {
        self.players.iter().filter(|p| p.ai).count()
    }
}

/// Point-in-time read of the game log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RawGameSnapshot {
    pub game_state: GameState,
    pub game_type: GameType,
    /// Log timestamp of the last game start (time since the client launched).
    pub timestamp: String,
    /// Seconds
    pub duration: u64,
    pub map: String,
    pub win_condition: String,
    pub left: RawTeam,
    pub right: RawTeam,
    pub player_name: String,
    pub player_steam_id: String,
    pub language_code: String,
}

impl RawGameSnapshot {
    /// All players, left roster first.
    pub fn players(&self) -> impl Iterator<Item = &RawPlayer> {
        self.left.players.iter().chain(self.right.players.iter())
    }

    /// Classic for pvp axis vs allies, AI when one roster is entirely AI and
    /// the other has none, Custom otherwise.
    pub fn classify(left: &RawTeam, right: &RawTeam) -> GameType {
        let opposing = left.side != TeamSide::Mixed
            && right.side != TeamSide::Mixed
            && left.side != right.side;
        if !opposing {
            return GameType::Custom;
        }
        let (left_ai, right_ai) = (left.ai_count(), right.ai_count());
        if left_ai + right_ai == 0 {
            GameType::Classic
        } else if (left_ai == 0 && right_ai == right.players.len())
            || (right_ai == 0 && left_ai == left.players.len())
        {
            GameType::AI
        } else {
            GameType::Custom
        }
    }
}

/// What the poller saw on its last tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogStatus {
    NotFound,
    Found(RawGameSnapshot),
}
