use std::path::Path;

use cohstats_types::{Faction, GameState};
use memchr::memchr_iter;
use tracing::debug;

use super::LogParser;
use crate::error::LogParseError;
use crate::game::{RawGameSnapshot, RawPlayer, RawTeam};

/// Log frames are 8 per second.
const FRAMES_PER_SECOND: u64 = 8;

#[derive(Debug, Default, Clone, Copy)]
pub struct WarningsLogParser;

impl LogParser for WarningsLogParser {
    fn parse(&self, path: &Path) -> Result<RawGameSnapshot, LogParseError> {
        let bytes = std::fs::read(path).map_err(|e| LogParseError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(parse_log(&bytes))
    }
}

#[derive(Default)]
struct ScanState {
    full_game: bool,
    running: bool,
    loading: bool,
    started: bool,
    ended: bool,
    map: String,
    win_condition: String,
    timestamp: String,
    duration: u64,
    left: Vec<RawPlayer>,
    right: Vec<RawPlayer>,
    player_name: String,
    player_steam_id: String,
    language_code: String,
}

/// Parse the contents of a game log.
///
/// The file is scanned from the end, so everything describes the most recent
/// match. Lines that are not valid UTF-8 are skipped.
pub fn parse_log(bytes: &[u8]) -> RawGameSnapshot {
    let mut st = ScanState {
        running: true,
        ..Default::default()
    };

    for &(start, end) in line_ranges(bytes).iter().rev() {
        let Ok(line) = std::str::from_utf8(&bytes[start..end]) else {
            continue;
        };
        let line = line.trim_end_matches('\r');

        if line.starts_with("Application closed") {
            st.running = false;
            continue;
        }

        let Some((time, tail)) = timestamped(line) else {
            continue;
        };

        if tail.starts_with("GameApp::SetState : new (Game)") {
            // Keep the most recent game start.
            if st.timestamp.is_empty() {
                st.timestamp = time.to_string();
            }
            continue;
        }

        if let Some(steam_id) = tail.strip_prefix("Found profile: /steam/") {
            st.player_steam_id = steam_id.trim().to_string();
            continue;
        }

        let Some((param, rest)) = split_nonempty(tail, " -- ") else {
            continue;
        };

        match param {
            "GAME" => {
                if let Some(name_tail) = rest.strip_prefix("Current Steam name is [") {
                    if let Some((name, _)) = name_tail.rsplit_once(']') {
                        st.player_name = name.to_string();
                    }
                    // Everything before this line belongs to earlier sessions.
                    break;
                }
                if let Some(lang_tail) = rest.strip_prefix("[Company of Heroes 3] set to language [") {
                    if let Some((lang, _)) = split_nonempty(lang_tail, "]") {
                        st.language_code = lang.to_string();
                    }
                    continue;
                }
                if rest.starts_with("Starting mission") {
                    if !st.full_game {
                        st.started = true;
                    }
                    continue;
                }
                if let Some((sub_param, value)) = split_nonempty(rest, ":") {
                    handle_game_param(&mut st, sub_param, value);
                }
            }
            "MOD" => {
                if let Some(frames) = rest.strip_prefix("Game Over at frame ") {
                    if !st.full_game {
                        if let Ok(frames) = frames.trim().parse::<u64>() {
                            st.duration = frames / FRAMES_PER_SECOND;
                        }
                        st.ended = true;
                    }
                }
            }
            _ => {}
        }
    }

    let game_state = game_state(st.running, st.ended, st.loading, st.started);
    let left = roster(st.left);
    let right = roster(st.right);
    let game_type = RawGameSnapshot::classify(&left, &right);

    debug!(
        players = left.players.len() + right.players.len(),
        state = %game_state,
        map = %st.map,
        "Log file parsed"
    );

    RawGameSnapshot {
        game_state,
        game_type,
        timestamp: st.timestamp,
        duration: st.duration,
        map: st.map,
        win_condition: st.win_condition,
        left,
        right,
        player_name: st.player_name,
        player_steam_id: st.player_steam_id,
        language_code: st.language_code,
    }
}

fn line_ranges(bytes: &[u8]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for end in memchr_iter(b'\n', bytes) {
        if end > start {
            ranges.push((start, end));
        }
        start = end + 1;
    }
    if start < bytes.len() {
        ranges.push((start, bytes.len()));
    }
    ranges
}

fn handle_game_param(st: &mut ScanState, sub_param: &str, value: &str) {
    if st.full_game {
        return;
    }
    match sub_param {
        "Scenario" => {
            if let Some((front, map)) = value.rsplit_once('\\') {
                if !front.is_empty() {
                    st.map = map.trim_end().to_string();
                    st.full_game = true;
                }
            }
        }
        "Win Condition Name" => {
            st.win_condition = value.trim().to_string();
            st.loading = true;
        }
        "Human Player" => {
            if let Some((side, player)) = roster_entry(value, false) {
                push_player(st, side, player);
            }
        }
        "AI Player" => {
            if let Some((side, player)) = roster_entry(value, true) {
                push_player(st, side, player);
            }
        }
        _ => {}
    }
}

fn push_player(st: &mut ScanState, side: u8, player: RawPlayer) {
    if side == 0 {
        st.left.push(player);
    } else {
        st.right.push(player);
    }
}

/// ` <position> <name with spaces> <relic id> <side> <faction>`
fn roster_entry(value: &str, ai: bool) -> Option<(u8, RawPlayer)> {
    let value = value.strip_prefix(' ')?;
    let (position, rest) = split_nonempty(value, " ")?;
    let (rest, faction) = rest.rsplit_once(' ')?;
    let (rest, side) = rest.rsplit_once(' ')?;
    let (name, relic_id) = rest.rsplit_once(' ')?;

    let position = position.parse::<u8>().ok()?;
    let side = side.parse::<u8>().ok()?;
    let faction = Faction::from_log(faction);

    let player = if ai {
        RawPlayer::ai(position, name, faction)
    } else {
        RawPlayer::human(position, name, relic_id, faction)
    };
    Some((side, player))
}

/// Rosters come out of the reverse scan backwards; put them in slot order.
fn roster(mut players: Vec<RawPlayer>) -> RawTeam {
    players.sort_by_key(|p| p.position);
    RawTeam::from_players(players)
}

fn game_state(running: bool, ended: bool, loading: bool, started: bool) -> GameState {
    if !running {
        GameState::Closed
    } else if ended || !loading {
        GameState::Menu
    } else if started {
        GameState::InGame
    } else {
        GameState::Loading
    }
}

/// `(I) [11:43:31.404] [000007332]: <tail>` → `("11:43:31.404", "<tail>")`
fn timestamped(line: &str) -> Option<(&str, &str)> {
    let (_, rest) = split_nonempty(line, "[")?;
    let (time, rest) = split_nonempty(rest, "]")?;
    let (_, tail) = split_nonempty(rest, "]: ")?;
    Some((time, tail))
}

/// Split at the first `sep`, requiring a non-empty part before it.
fn split_nonempty<'a>(s: &'a str, sep: &str) -> Option<(&'a str, &'a str)> {
    match s.split_once(sep) {
        Some((front, back)) if !front.is_empty() => Some((front, back)),
        _ => None,
    }
}
