//! Arranged-team detection
//!
//! Players in a match who have a recorded history of playing together form
//! a [`KnownFriendsGroup`]. Two players are related when some team record
//! contains both; groups are the connected components of that relation,
//! restricted to the current match roster.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use cohstats_types::TeamSide;
use serde::{Deserialize, Serialize};

/// Colours handed out to groups, in order.
pub const GROUP_COLORS: [&str; 6] = ["green", "orange", "violet", "pink", "cyan", "blue"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TeamMember {
    pub profile_id: u64,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// A team as the community stats service records it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TeamRecord {
    #[serde(default)]
    pub id: String,
    pub player_ids: Vec<u64>,
    #[serde(default)]
    pub players: Vec<TeamMember>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub elo: i64,
    #[serde(rename = "bestElo", default)]
    pub best_elo: i64,
    #[serde(rename = "w", default)]
    pub wins: i64,
    #[serde(rename = "l", default)]
    pub losses: i64,
    #[serde(rename = "s", default)]
    pub streak: i64,
    /// Total games
    #[serde(rename = "t", default)]
    pub total: i64,
    /// Last match, unix seconds
    #[serde(rename = "lmTS", default)]
    pub last_match_ts: Option<i64>,
    #[serde(rename = "mh", default)]
    pub match_history: Vec<serde_json::Value>,
}

impl TeamRecord {
    pub fn contains(&self, player_id: u64) -> bool {
        self.player_ids.contains(&player_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownFriendsGroup {
    /// Ascending
    pub player_ids: Vec<u64>,
    /// Every input record whose whole roster is inside this group.
    pub teams: Vec<TeamRecord>,
    pub color: Option<String>,
}

/// Key the stats service files a team under: `<side>-<sorted ids>`.
pub fn team_key(side: TeamSide, player_ids: &[u64]) -> String {
    let mut ids = player_ids.to_vec();
    ids.sort_unstable();
    let mut key = side.api_name().to_string();
    for id in ids {
        key.push('-');
        key.push_str(&id.to_string());
    }
    key
}

/// Connected components of "has played together" among `player_ids`.
///
/// Players with no partner in the match are left out. Groups come out in
/// the order their first member appears in `player_ids`.
pub fn group_players_by_team_relationships(
    teams: &[TeamRecord],
    player_ids: &[u64],
) -> Vec<KnownFriendsGroup> {
    if teams.is_empty() || player_ids.is_empty() {
        return Vec::new();
    }

    let mut adjacency: HashMap<u64, BTreeSet<u64>> =
        player_ids.iter().map(|id| (*id, BTreeSet::new())).collect();

    for team in teams {
        let in_match: Vec<u64> = team
            .player_ids
            .iter()
            .copied()
            .filter(|id| adjacency.contains_key(id))
            .collect();
        for (i, a) in in_match.iter().enumerate() {
            for b in &in_match[i + 1..] {
                if a == b {
                    continue;
                }
                if let Some(edges) = adjacency.get_mut(a) {
                    edges.insert(*b);
                }
                if let Some(edges) = adjacency.get_mut(b) {
                    edges.insert(*a);
                }
            }
        }
    }

    let mut visited = BTreeSet::new();
    let mut groups = Vec::new();

    for &start in player_ids {
        if visited.contains(&start) {
            continue;
        }
        let component = component_of(start, &adjacency, &mut visited);
        if component.len() < 2 {
            continue;
        }

        let relevant = teams
            .iter()
            .filter(|t| !t.player_ids.is_empty())
            .filter(|t| t.player_ids.iter().all(|id| component.contains(id)))
            .cloned()
            .collect();

        groups.push(KnownFriendsGroup {
            player_ids: component.into_iter().collect(),
            teams: relevant,
            color: None,
        });
    }

    groups
}

fn component_of(
    start: u64,
    adjacency: &HashMap<u64, BTreeSet<u64>>,
    visited: &mut BTreeSet<u64>,
) -> BTreeSet<u64> {
    let mut component = BTreeSet::new();
    let mut stack = vec![start];
    visited.insert(start);

    while let Some(id) = stack.pop() {
        component.insert(id);
        for next in adjacency.get(&id).into_iter().flatten() {
            if visited.insert(*next) {
                stack.push(*next);
            }
        }
    }
    component
}

/// The record whose roster is exactly `player_ids`, in any order.
pub fn find_complete_team<'a>(teams: &'a [TeamRecord], player_ids: &[u64]) -> Option<&'a TeamRecord> {
    let mut wanted = player_ids.to_vec();
    wanted.sort_unstable();

    teams.iter().find(|team| {
        let mut ids = team.player_ids.clone();
        ids.sort_unstable();
        ids == wanted
    })
}

/// Largest record containing `player_id`. Among equally large records the
/// first one in `teams` wins.
pub fn find_largest_team_for_player(teams: &[TeamRecord], player_id: u64) -> Option<&TeamRecord> {
    teams
        .iter()
        .filter(|t| t.contains(player_id))
        .min_by_key(|t| Reverse(t.player_ids.len()))
}

/// Give each group a display colour, cycling through [`GROUP_COLORS`].
pub fn assign_group_colors(groups: &mut [KnownFriendsGroup]) {
    for (group, color) in groups.iter_mut().zip(GROUP_COLORS.iter().cycle()) {
        group.color = Some((*color).to_string());
    }
}
