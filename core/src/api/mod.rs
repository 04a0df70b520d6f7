//! Remote stats services
//!
//! - [`RelicApi`]: the game's own leaderboard service (player profiles, ladders
//!   and recent match history)
//! - [`Coh3StatsApi`]: the community stats proxy (arranged team records)

mod coh3stats;
mod leaderboards;
mod matches;
mod relic;
mod types;

pub use coh3stats::{COH3STATS_PROXY_BASE, Coh3StatsApi};
pub use leaderboards::{leaderboard_id, leaderboard_slot};
pub use matches::{
    MatchHistory, MatchOutcome, MatchPlayer, MatchRecord, automatch_kind, race_from_id,
};
pub use relic::{RELIC_API_BASE, RelicApi, SortBy, StatsApi};
pub use types::{Ladders, LeaderboardStat, ProfileMember, RelicResult, StatGroup};

use std::time::Duration;

use reqwest::Client;

use crate::error::ApiError;

const USER_AGENT: &str = concat!("cohstats/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn http_client() -> Result<Client, ApiError> {
    Ok(Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?)
}
