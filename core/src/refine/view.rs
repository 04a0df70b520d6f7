use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cohstats_types::{Faction, GameState, GameType, LeaderboardMode, Race, TeamSide};
use serde::{Deserialize, Serialize};

use crate::api::{Ladders, leaderboard_id, leaderboard_slot};
use crate::game::{MatchFingerprint, RawPlayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WinLoss {
    pub wins: i64,
    pub losses: i64,
}

impl WinLoss {
    pub fn total(&self) -> i64 {
        self.wins + self.losses
    }
}

/// A roster entry with whatever the leaderboard service told us about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullPlayer {
    pub ai: bool,
    pub faction: Faction,
    pub relic_id: String,
    pub name: String,
    pub position: u8,
    pub color: String,

    pub country: Option<String>,
    pub steam_id: Option<String>,
    pub level: Option<i64>,
    pub xp: Option<i64>,

    pub rank: Option<i64>,
    pub rank_level: Option<i64>,
    pub rank_total: Option<i64>,
    pub rating: Option<i64>,
    pub region_rank: Option<i64>,
    pub region_rank_total: Option<i64>,
    pub streak: Option<i64>,
    pub wins: Option<i64>,
    pub losses: Option<i64>,
    pub disputes: Option<i64>,
    pub drops: Option<i64>,
    pub last_match_date: Option<DateTime<Utc>>,

    /// Ranked games across every faction ladder
    pub total_games: Option<i64>,
    pub faction_stats: BTreeMap<Race, WinLoss>,
}

impl FullPlayer {
    pub fn from_raw(raw: &RawPlayer, color: &str) -> Self {
        Self {
            ai: raw.ai,
            faction: raw.faction,
            relic_id: raw.relic_id.clone(),
            name: raw.name.clone(),
            position: raw.position,
            color: color.to_string(),
            country: None,
            steam_id: None,
            level: None,
            xp: None,
            rank: None,
            rank_level: None,
            rank_total: None,
            rating: None,
            region_rank: None,
            region_rank_total: None,
            streak: None,
            wins: None,
            losses: None,
            disputes: None,
            drops: None,
            last_match_date: None,
            total_games: None,
            faction_stats: BTreeMap::new(),
        }
    }

    /// Merge a personal-stats response into this player.
    ///
    /// `mode` selects the ladder entry shown for the player's faction; the
    /// aggregates use every faction ladder in the response.
    pub fn apply_stats(&mut self, ladders: &Ladders, mode: Option<LeaderboardMode>) {
        if let Some(member) = ladders.member(&self.relic_id) {
            self.country = member.country.clone();
            self.steam_id = member.steam_id().map(str::to_string);
            self.level = member.level;
            self.xp = member.xp;
        }

        let current = mode
            .zip(self.faction.race())
            .and_then(|(mode, race)| ladders.stat(leaderboard_id(mode, race)));
        if let Some(stat) = current {
            self.rank = Some(stat.rank);
            self.rank_level = Some(stat.ranklevel);
            self.rank_total = stat.ranktotal;
            self.rating = Some(stat.rating);
            self.region_rank = stat.regionrank;
            self.region_rank_total = stat.regionranktotal;
            self.streak = Some(stat.streak);
            self.wins = Some(stat.wins);
            self.losses = Some(stat.losses);
            self.disputes = Some(stat.disputes);
            self.drops = Some(stat.drops);
            self.last_match_date = stat.last_match_date();
        }

        let mut per_race: BTreeMap<Race, WinLoss> = BTreeMap::new();
        for stat in &ladders.leaderboard_stats {
            if let Some((_, race)) = leaderboard_slot(stat.leaderboard_id) {
                let entry = per_race.entry(race).or_default();
                entry.wins += stat.wins;
                entry.losses += stat.losses;
            }
        }
        self.total_games = Some(per_race.values().map(WinLoss::total).sum());
        self.faction_stats = per_race;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FullTeam {
    pub players: Vec<FullPlayer>,
    pub side: TeamSide,
}

/// The enriched view of the current match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullGameView {
    pub fingerprint: MatchFingerprint,
    pub state: GameState,
    pub game_type: GameType,
    pub timestamp: String,
    pub duration: u64,
    pub map: String,
    pub win_condition: String,
    pub left: FullTeam,
    pub right: FullTeam,
}

impl FullGameView {
    pub fn players(&self) -> impl Iterator<Item = &FullPlayer> {
        self.left.players.iter().chain(self.right.players.iter())
    }

    /// The human player whose Steam id matches the one the log reported.
    pub fn local_player(&self, steam_id: &str) -> Option<&FullPlayer> {
        if steam_id.is_empty() {
            return None;
        }
        self.players()
            .find(|p| !p.ai && p.steam_id.as_deref() == Some(steam_id))
    }
}
