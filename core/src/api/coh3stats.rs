use futures_util::future::join_all;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use cohstats_types::TeamSide;

use super::http_client;
use crate::error::ApiError;
use crate::teams::{TeamRecord, team_key};

pub const COH3STATS_PROXY_BASE: &str = "https://cache-aws.coh3stats.com";

/// Client for the community stats proxy.
#[derive(Clone)]
pub struct Coh3StatsApi {
    client: Client,
    base_url: String,
}

impl Coh3StatsApi {
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(COH3STATS_PROXY_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Team record by key (see [`team_key`]). `None` if the service has
    /// never seen that team.
    pub async fn team_details(&self, key: &str) -> Result<Option<TeamRecord>, ApiError> {
        let url = format!("{}/sharedAPIGen2Http/teams/{}", self.base_url, key);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(team = key, "Team not found");
            return Ok(None);
        }
        let body = response.error_for_status()?.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Every recorded team formed by two or more of `player_ids` on `side`.
    ///
    /// Lookups that fail are logged and skipped.
    pub async fn teams_among(&self, side: TeamSide, player_ids: &[u64]) -> Vec<TeamRecord> {
        let keys: Vec<String> = subsets(player_ids)
            .into_iter()
            .map(|ids| team_key(side, &ids))
            .collect();

        let results = join_all(keys.iter().map(|key| self.team_details(key))).await;

        keys.iter()
            .zip(results)
            .filter_map(|(key, result)| match result {
                Ok(team) => team,
                Err(e) => {
                    warn!(team = %key, error = %e, "Team lookup failed");
                    None
                }
            })
            .collect()
    }
}

/// Subsets of size two and up, in a stable order.
fn subsets(ids: &[u64]) -> Vec<Vec<u64>> {
    let n = ids.len().min(8);
    (1u32..(1 << n))
        .filter(|mask| mask.count_ones() >= 2)
        .map(|mask| {
            (0..n)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| ids[i])
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsets_of_three() {
        let mut sets = subsets(&[1, 2, 3]);
        sets.sort();
        assert_eq!(sets, vec![vec![1, 2], vec![1, 2, 3], vec![1, 3], vec![2, 3]]);
    }

    #[test]
    fn no_subsets_for_single_player() {
        assert!(subsets(&[1]).is_empty());
        assert!(subsets(&[]).is_empty());
    }
}
