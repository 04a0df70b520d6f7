//! Recent match history from the Relic leaderboard service.

use chrono::{DateTime, Utc};
use cohstats_types::{LeaderboardMode, Race};
use serde::{Deserialize, Serialize};

use super::types::{ProfileMember, RelicResult, check_result};
use crate::error::ApiError;

/// Raw `getrecentmatchhistorybyprofileId` response.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchHistory {
    #[serde(default)]
    pub result: Option<RelicResult>,
    #[serde(rename = "matchHistoryStats", default)]
    pub matches: Vec<RawMatch>,
    #[serde(default)]
    pub profiles: Vec<ProfileMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMatch {
    pub id: u64,
    #[serde(default)]
    pub mapname: String,
    pub matchtype_id: u32,
    pub startgametime: i64,
    pub completiontime: i64,
    #[serde(default)]
    pub matchhistoryreportresults: Vec<RawReportResult>,
    #[serde(default)]
    pub matchhistorymember: Vec<RawHistoryMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReportResult {
    pub profile_id: u64,
    pub resulttype: i64,
    #[serde(default)]
    pub teamid: u32,
    #[serde(default)]
    pub race_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHistoryMember {
    pub profile_id: u64,
    pub oldrating: i64,
    pub newrating: i64,
    #[serde(default)]
    pub wins: i64,
    #[serde(default)]
    pub losses: i64,
}

/// Faction for a match-history `race_id`.
pub fn race_from_id(race_id: u64) -> Option<Race> {
    match race_id {
        129494 => Some(Race::American),
        137123 => Some(Race::German),
        // British_Africa reports a second id
        197345 | 203852 => Some(Race::British),
        198437 => Some(Race::Dak),
        _ => None,
    }
}

/// Queue size and ranked flag for automatch queues; `None` for custom and
/// AI games.
pub fn automatch_kind(matchtype_id: u32) -> Option<(LeaderboardMode, bool)> {
    match matchtype_id {
        1..=4 => LeaderboardMode::from_team_size(matchtype_id as usize).map(|m| (m, true)),
        20..=23 => LeaderboardMode::from_team_size(matchtype_id as usize - 19).map(|m| (m, false)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchOutcome {
    Win,
    Loss,
    Other(i64),
}

impl From<i64> for MatchOutcome {
    fn from(resulttype: i64) -> Self {
        match resulttype {
            1 => MatchOutcome::Win,
            0 => MatchOutcome::Loss,
            other => MatchOutcome::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPlayer {
    pub profile_id: u64,
    pub alias: String,
    pub country: Option<String>,
    pub race: Option<Race>,
    pub team_id: u32,
    pub outcome: MatchOutcome,
    pub old_rating: Option<i64>,
    pub new_rating: Option<i64>,
    pub wins: Option<i64>,
    pub losses: Option<i64>,
}

impl MatchPlayer {
    pub fn rating_change(&self) -> Option<i64> {
        Some(self.new_rating? - self.old_rating?)
    }

    /// Fewer than ten ladder games means the rating is provisional.
    pub fn is_placed(&self) -> bool {
        self.wins.unwrap_or(0) + self.losses.unwrap_or(0) >= 10
    }
}

/// One finished automatch game with every player's result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub id: u64,
    pub map: String,
    pub mode: LeaderboardMode,
    pub ranked: bool,
    pub started_at: i64,
    pub completed_at: i64,
    pub players: Vec<MatchPlayer>,
}

impl MatchRecord {
    /// Seconds between start and completion.
    pub fn duration(&self) -> u64 {
        (self.completed_at - self.started_at).max(0) as u64
    }

    pub fn completed(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.completed_at, 0)
    }

    pub fn player(&self, profile_id: u64) -> Option<&MatchPlayer> {
        self.players.iter().find(|p| p.profile_id == profile_id)
    }
}

impl MatchHistory {
    pub fn from_body(body: &str) -> Result<Self, ApiError> {
        let history: MatchHistory = serde_json::from_str(body)?;
        check_result(history.result.as_ref())?;
        Ok(history)
    }

    /// Automatch games only, newest first, each player joined with their
    /// profile and rating change.
    pub fn into_records(self) -> Vec<MatchRecord> {
        let profiles = self.profiles;
        let mut records: Vec<MatchRecord> = self
            .matches
            .into_iter()
            .filter_map(|raw| {
                let (mode, ranked) = automatch_kind(raw.matchtype_id)?;
                let players = raw
                    .matchhistoryreportresults
                    .iter()
                    .map(|result| {
                        let profile = profiles.iter().find(|p| p.profile_id == result.profile_id);
                        let member = raw
                            .matchhistorymember
                            .iter()
                            .find(|m| m.profile_id == result.profile_id);
                        MatchPlayer {
                            profile_id: result.profile_id,
                            alias: profile.map(|p| p.alias.clone()).unwrap_or_default(),
                            country: profile.and_then(|p| p.country.clone()),
                            race: race_from_id(result.race_id),
                            team_id: result.teamid,
                            outcome: result.resulttype.into(),
                            old_rating: member.map(|m| m.oldrating),
                            new_rating: member.map(|m| m.newrating),
                            wins: member.map(|m| m.wins),
                            losses: member.map(|m| m.losses),
                        }
                    })
                    .collect();
                Some(MatchRecord {
                    id: raw.id,
                    map: raw.mapname,
                    mode,
                    ranked,
                    started_at: raw.startgametime,
                    completed_at: raw.completiontime,
                    players,
                })
            })
            .collect();
        records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY: &str = r#"{
        "result": {"code": 0, "message": "SUCCESS"},
        "matchHistoryStats": [
            {
                "id": 100, "mapname": "twin_beach_2p", "matchtype_id": 1,
                "startgametime": 1700000000, "completiontime": 1700001500,
                "matchhistoryreportresults": [
                    {"profile_id": 3264, "resulttype": 1, "teamid": 0, "race_id": 137123},
                    {"profile_id": 42, "resulttype": 0, "teamid": 1, "race_id": 203852}
                ],
                "matchhistorymember": [
                    {"profile_id": 3264, "oldrating": 1400, "newrating": 1416, "wins": 30, "losses": 20},
                    {"profile_id": 42, "oldrating": 1380, "newrating": 1364, "wins": 3, "losses": 2}
                ]
            },
            {
                "id": 101, "mapname": "custom_map", "matchtype_id": 0,
                "startgametime": 1700002000, "completiontime": 1700003000,
                "matchhistoryreportresults": [
                    {"profile_id": 3264, "resulttype": 1, "teamid": 0, "race_id": 137123}
                ]
            },
            {
                "id": 102, "mapname": "winter_line_8p_mkii", "matchtype_id": 21,
                "startgametime": 1700004000, "completiontime": 1700005000,
                "matchhistoryreportresults": [
                    {"profile_id": 3264, "resulttype": 0, "teamid": 1, "race_id": 198437},
                    {"profile_id": 7, "resulttype": 1, "teamid": 0, "race_id": 129494}
                ]
            }
        ],
        "profiles": [
            {"profile_id": 3264, "name": "/steam/7656100", "alias": "Tester", "country": "de"},
            {"profile_id": 42, "name": "/steam/7656142", "alias": "Rival", "country": "gb"}
        ]
    }"#;

    #[test]
    fn keeps_automatch_games_newest_first() {
        let records = MatchHistory::from_body(HISTORY).unwrap().into_records();
        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![102, 100]);
        assert_eq!(records[0].mode, LeaderboardMode::TwoVsTwo);
        assert!(!records[0].ranked);
        assert_eq!(records[1].mode, LeaderboardMode::OneVsOne);
        assert!(records[1].ranked);
        assert_eq!(records[1].duration(), 1500);
    }

    #[test]
    fn joins_profiles_and_rating_changes() {
        let records = MatchHistory::from_body(HISTORY).unwrap().into_records();
        let ranked = &records[1];

        let tester = ranked.player(3264).unwrap();
        assert_eq!(tester.alias, "Tester");
        assert_eq!(tester.country.as_deref(), Some("de"));
        assert_eq!(tester.race, Some(Race::German));
        assert_eq!(tester.outcome, MatchOutcome::Win);
        assert_eq!(tester.rating_change(), Some(16));
        assert!(tester.is_placed());

        let rival = ranked.player(42).unwrap();
        assert_eq!(rival.race, Some(Race::British));
        assert_eq!(rival.outcome, MatchOutcome::Loss);
        assert_eq!(rival.rating_change(), Some(-16));
        assert!(!rival.is_placed());
    }

    #[test]
    fn players_without_profile_or_member_keep_their_result() {
        let records = MatchHistory::from_body(HISTORY).unwrap().into_records();
        let stranger = records[0].player(7).unwrap();
        assert_eq!(stranger.alias, "");
        assert_eq!(stranger.race, Some(Race::American));
        assert_eq!(stranger.outcome, MatchOutcome::Win);
        assert_eq!(stranger.rating_change(), None);
        assert!(records[0].player(42).is_none());
    }

    #[test]
    fn unregistered_profile_is_rejected() {
        let body = r#"{"result": {"code": 2, "message": "UNREGISTERED_PROFILE_NAME"}}"#;
        assert!(matches!(
            MatchHistory::from_body(body),
            Err(ApiError::Rejected { message }) if message == "UNREGISTERED_PROFILE_NAME"
        ));
    }

    #[test]
    fn unknown_queue_and_race_ids() {
        assert_eq!(automatch_kind(0), None);
        assert_eq!(automatch_kind(5), None);
        assert_eq!(automatch_kind(24), None);
        assert_eq!(automatch_kind(4), Some((LeaderboardMode::FourVsFour, true)));
        assert_eq!(race_from_id(1), None);
        assert_eq!(MatchOutcome::from(4), MatchOutcome::Other(4));
    }
}
