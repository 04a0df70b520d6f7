//! Display formatting for player statistics.
//!
//! Every stat shown in the overlay or printed by the CLI goes through this
//! module so that missing values, streak signs and ratios look the same
//! everywhere.

/// Placeholder shown for any stat the leaderboard did not provide.
pub const MISSING: &str = "-";

/// Format a win ratio from wins/losses with 1 decimal place.
///
/// Returns [`MISSING`] when either side is unknown or no games were played.
///
/// # Examples
/// ```
/// use cohstats_types::formatting::format_win_ratio;
/// assert_eq!(format_win_ratio(Some(3), Some(1)), "75.0%");
/// assert_eq!(format_win_ratio(Some(0), Some(0)), "-");
/// assert_eq!(format_win_ratio(None, Some(4)), "-");
/// ```
pub fn format_win_ratio(wins: Option<i64>, losses: Option<i64>) -> String {
    match (wins, losses) {
        (Some(w), Some(l)) if w + l > 0 => format!("{:.1}%", w as f64 / (w + l) as f64 * 100.0),
        _ => MISSING.to_string(),
    }
}

/// Format a streak with an explicit sign for winning streaks.
///
/// # Examples
/// ```
/// use cohstats_types::formatting::format_streak;
/// assert_eq!(format_streak(Some(3)), "+3");
/// assert_eq!(format_streak(Some(-2)), "-2");
/// assert_eq!(format_streak(Some(0)), "0");
/// assert_eq!(format_streak(None), "-");
/// ```
pub fn format_streak(streak: Option<i64>) -> String {
    match streak {
        Some(s) if s > 0 => format!("+{}", s),
        Some(s) => s.to_string(),
        None => MISSING.to_string(),
    }
}

/// Format a leaderboard rank.
///
/// The API reports `-1` (or `0`) for players that are not ranked yet.
///
/// # Examples
/// ```
/// use cohstats_types::formatting::format_rank;
/// assert_eq!(format_rank(Some(42)), "#42");
/// assert_eq!(format_rank(Some(-1)), "-");
/// assert_eq!(format_rank(None), "-");
/// ```
pub fn format_rank(rank: Option<i64>) -> String {
    match rank {
        Some(r) if r > 0 => format!("#{}", r),
        _ => MISSING.to_string(),
    }
}

/// Format an optional integer stat (rating, wins, level ...).
///
/// # Examples
/// ```
/// use cohstats_types::formatting::format_stat;
/// assert_eq!(format_stat(Some(1234)), "1234");
/// assert_eq!(format_stat(None), "-");
/// ```
pub fn format_stat(value: Option<i64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

/// Format a match duration as `M:SS`, or `H:MM:SS` for long games.
///
/// # Examples
/// ```
/// use cohstats_types::formatting::format_match_duration;
/// assert_eq!(format_match_duration(125), "2:05");
/// assert_eq!(format_match_duration(0), "0:00");
/// assert_eq!(format_match_duration(3_725), "1:02:05");
/// ```
pub fn format_match_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_win_ratio() {
        assert_eq!(format_win_ratio(Some(1), Some(1)), "50.0%");
        assert_eq!(format_win_ratio(Some(2), Some(1)), "66.7%");
        assert_eq!(format_win_ratio(Some(5), Some(0)), "100.0%");
        assert_eq!(format_win_ratio(Some(0), Some(0)), MISSING);
        assert_eq!(format_win_ratio(Some(1), None), MISSING);
    }

    #[test]
    fn test_format_streak() {
        assert_eq!(format_streak(Some(1)), "+1");
        assert_eq!(format_streak(Some(-7)), "-7");
        assert_eq!(format_streak(None), MISSING);
    }

    #[test]
    fn test_format_rank() {
        assert_eq!(format_rank(Some(1)), "#1");
        assert_eq!(format_rank(Some(0)), MISSING);
        assert_eq!(format_rank(Some(-1)), MISSING);
    }

    #[test]
    fn test_format_match_duration() {
        assert_eq!(format_match_duration(59), "0:59");
        assert_eq!(format_match_duration(60), "1:00");
        assert_eq!(format_match_duration(3_600), "1:00:00");
    }
}
