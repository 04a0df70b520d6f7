//! Relic leaderboard service response shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

const SUCCESS: &str = "SUCCESS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelicResult {
    pub code: i64,
    pub message: String,
}

/// Only a `SUCCESS` status makes a response body trustworthy.
pub(crate) fn check_result(result: Option<&RelicResult>) -> Result<(), ApiError> {
    match result {
        None => Err(ApiError::MissingResult),
        Some(result) if result.message != SUCCESS => Err(ApiError::Rejected {
            message: result.message.clone(),
        }),
        Some(_) => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMember {
    pub profile_id: u64,
    /// Platform path, e.g. `/steam/76561198000000000`
    pub name: String,
    pub alias: String,
    #[serde(default)]
    pub personal_statgroup_id: Option<u64>,
    #[serde(default)]
    pub xp: Option<i64>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub leaderboardregion_id: Option<i64>,
    #[serde(default)]
    pub country: Option<String>,
}

impl ProfileMember {
    /// Last path segment of `name`.
    pub fn steam_id(&self) -> Option<&str> {
        self.name.rsplit('/').next().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatGroup {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<i64>,
    #[serde(default)]
    pub members: Vec<ProfileMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardStat {
    pub statgroup_id: u64,
    pub leaderboard_id: u64,
    pub wins: i64,
    pub losses: i64,
    pub streak: i64,
    #[serde(default)]
    pub disputes: i64,
    #[serde(default)]
    pub drops: i64,
    pub rank: i64,
    #[serde(default)]
    pub ranktotal: Option<i64>,
    #[serde(default)]
    pub regionrank: Option<i64>,
    #[serde(default)]
    pub regionranktotal: Option<i64>,
    pub ranklevel: i64,
    pub rating: i64,
    /// Unix seconds
    pub lastmatchdate: i64,
}

impl LeaderboardStat {
    pub fn last_match_date(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.lastmatchdate, 0)
    }
}

/// Body of both `getpersonalstat` and `getleaderboard2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ladders {
    #[serde(default)]
    pub result: Option<RelicResult>,
    #[serde(rename = "statGroups", default)]
    pub stat_groups: Vec<StatGroup>,
    #[serde(rename = "leaderboardStats", default)]
    pub leaderboard_stats: Vec<LeaderboardStat>,
    #[serde(rename = "rankTotal", default)]
    pub rank_total: Option<i64>,
}

impl Ladders {
    /// Decode a response body, rejecting anything the service did not
    /// mark as successful. A body without a `result` status is rejected too.
    pub fn from_body(body: &str) -> Result<Self, ApiError> {
        let ladders: Ladders = serde_json::from_str(body)?;
        check_result(ladders.result.as_ref())?;
        Ok(ladders)
    }

    pub fn member(&self, profile_id: &str) -> Option<&ProfileMember> {
        self.stat_groups
            .iter()
            .flat_map(|g| g.members.iter())
            .find(|m| m.profile_id.to_string() == profile_id)
    }

    pub fn stat(&self, leaderboard_id: u64) -> Option<&LeaderboardStat> {
        self.leaderboard_stats
            .iter()
            .find(|s| s.leaderboard_id == leaderboard_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSONAL: &str = r#"{
        "result": {"code": 0, "message": "SUCCESS"},
        "statGroups": [{
            "id": 10, "name": "", "type": 1,
            "members": [{
                "profile_id": 3264, "name": "/steam/76561198000000001",
                "alias": "Tester", "personal_statgroup_id": 10,
                "xp": 1200, "level": 7, "leaderboardregion_id": 2, "country": "de"
            }]
        }],
        "leaderboardStats": [{
            "statgroup_id": 10, "leaderboard_id": 2130255,
            "wins": 30, "losses": 10, "streak": 3, "disputes": 0, "drops": 1,
            "rank": 42, "ranktotal": 5000, "regionrank": 7, "regionranktotal": 900,
            "ranklevel": 15, "rating": 1420, "lastmatchdate": 1690000000
        }]
    }"#;

    #[test]
    fn decodes_personal_stats() {
        let ladders = Ladders::from_body(PERSONAL).unwrap();
        let member = ladders.member("3264").unwrap();
        assert_eq!(member.steam_id(), Some("76561198000000001"));
        assert_eq!(member.country.as_deref(), Some("de"));

        let stat = ladders.stat(2130255).unwrap();
        assert_eq!(stat.rank, 42);
        assert_eq!(
            stat.last_match_date().map(|d| d.timestamp()),
            Some(1690000000)
        );
        assert!(ladders.stat(2130257).is_none());
        assert!(ladders.member("1").is_none());
    }

    #[test]
    fn non_success_is_rejected() {
        let body = r#"{"result": {"code": 5, "message": "UNREGISTERED_PROFILE_NAME"}}"#;
        let err = Ladders::from_body(body).unwrap_err();
        assert!(matches!(err, ApiError::Rejected { message } if message == "UNREGISTERED_PROFILE_NAME"));
    }

    #[test]
    fn missing_result_is_rejected() {
        let body = r#"{"statGroups": [], "leaderboardStats": []}"#;
        assert!(matches!(
            Ladders::from_body(body),
            Err(ApiError::MissingResult)
        ));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(Ladders::from_body("<html>"), Err(ApiError::Decode(_))));
    }
}
