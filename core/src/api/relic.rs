use std::future::Future;

use reqwest::Client;
use tracing::debug;

use super::http_client;
use super::matches::{MatchHistory, MatchRecord};
use super::types::Ladders;
use crate::error::ApiError;

pub const RELIC_API_BASE: &str = "https://coh3-api.reliclink.com";
const TITLE: &str = "coh3";

/// Source of per-player ladder data.
pub trait StatsApi: Send + Sync {
    /// Profile and every ladder entry for one player.
    fn personal_stats(
        &self,
        relic_id: &str,
    ) -> impl Future<Output = Result<Ladders, ApiError>> + Send;
}

/// Ladder ordering for [`RelicApi::leaderboard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    Wins,
    #[default]
    Rating,
}

impl SortBy {
    fn param(self) -> u8 {
        match self {
            SortBy::Wins => 0,
            SortBy::Rating => 1,
        }
    }
}

#[derive(Clone)]
pub struct RelicApi {
    client: Client,
    base_url: String,
}

impl RelicApi {
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(RELIC_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// One page of a ladder. `start` is 1-based.
    pub async fn leaderboard(
        &self,
        leaderboard_id: u64,
        start: u32,
        count: u32,
        sort_by: SortBy,
    ) -> Result<Ladders, ApiError> {
        let url = format!("{}/community/leaderboard/getleaderboard2", self.base_url);
        let query = [
            ("count", count.to_string()),
            ("leaderboard_id", leaderboard_id.to_string()),
            ("start", start.max(1).to_string()),
            ("sortBy", sort_by.param().to_string()),
            ("title", TITLE.to_string()),
        ];
        debug!(leaderboard_id, start, count, "Fetching leaderboard");
        self.get_ladders(&url, &query).await
    }

    /// A player's recent automatch games, newest first.
    pub async fn recent_matches(&self, profile_id: u64) -> Result<Vec<MatchRecord>, ApiError> {
        let url = format!(
            "{}/community/leaderboard/getrecentmatchhistorybyprofileId",
            self.base_url
        );
        let query = [
            ("profile_id", profile_id.to_string()),
            ("title", TITLE.to_string()),
        ];
        debug!(profile_id, "Fetching recent matches");
        let body = self.get_body(&url, &query).await?;
        Ok(MatchHistory::from_body(&body)?.into_records())
    }

    async fn get_ladders(&self, url: &str, query: &[(&str, String)]) -> Result<Ladders, ApiError> {
        let body = self.get_body(url, query).await?;
        Ladders::from_body(&body)
    }

    async fn get_body(&self, url: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        Ok(self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }
}

impl StatsApi for RelicApi {
    async fn personal_stats(&self, relic_id: &str) -> Result<Ladders, ApiError> {
        let url = format!("{}/community/leaderboard/getpersonalstat", self.base_url);
        let query = [
            ("profile_ids", format!("[{relic_id}]")),
            ("title", TITLE.to_string()),
        ];
        debug!(relic_id, "Fetching personal stats");
        self.get_ladders(&url, &query).await
    }
}
