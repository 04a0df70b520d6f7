//! Streamer overlay
//!
//! Renders the current match as a standalone HTML page that a browser
//! source can point at. The page is rewritten on every refiner transition.

use std::fmt::Write;

use cohstats_types::GameState;
use cohstats_types::formatting::{format_rank, format_stat, format_streak, format_win_ratio};

use crate::refine::{FullGameView, FullPlayer, FullTeam};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayOptions {
    /// Prefix each player with their country flag.
    pub show_flags: bool,
    /// Show the rosters in every game state, not only during a match.
    pub always_show: bool,
}

const STYLE: &str = "\
body { margin: 0; font-family: sans-serif; color: #fff; background: transparent; }
.teams { display: flex; position: absolute; top: 65px; left: calc(50vw - 450px); right: calc(50vw - 450px); }
.team { flex: 1 1 0; padding: 0 10px; }
.team.left { padding-right: 40px; }
.team.right { padding-left: 40px; }
.player { display: flex; gap: 8px; margin-bottom: 4px; padding: 2px 6px; background: rgba(0, 0, 0, 0.6); border-left: 4px solid; }
.player .name { flex: 1; overflow: hidden; white-space: nowrap; text-overflow: ellipsis; }
";

pub fn render_overlay(view: &FullGameView, options: &OverlayOptions) -> String {
    let visible = options.always_show || matches!(view.state, GameState::Loading | GameState::InGame);

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>cohstats overlay</title>\n<style>\n");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n");
    let _ = writeln!(
        html,
        "<body data-state=\"{}\" data-map=\"{}\">",
        view.state,
        escape_html(&view.map)
    );

    if visible {
        html.push_str("<div class=\"teams\">\n");
        render_team(&mut html, "left", &view.left, options);
        render_team(&mut html, "right", &view.right, options);
        html.push_str("</div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_team(html: &mut String, class: &str, team: &FullTeam, options: &OverlayOptions) {
    let _ = writeln!(html, "<div class=\"team {class}\">");
    for player in &team.players {
        render_player(html, player, options);
    }
    html.push_str("</div>\n");
}

fn render_player(html: &mut String, player: &FullPlayer, options: &OverlayOptions) {
    let _ = write!(
        html,
        "<div class=\"player\" style=\"border-color: {}\">",
        escape_html(&player.color)
    );

    if options.show_flags {
        let flag = player
            .country
            .as_deref()
            .and_then(flag_emoji)
            .unwrap_or_default();
        let _ = write!(html, "<span class=\"flag\">{flag}</span>");
    }

    if player.ai {
        let _ = write!(
            html,
            "<span class=\"name\">{}</span><span class=\"ai\">AI</span>",
            escape_html(&player.name)
        );
    } else {
        let _ = write!(
            html,
            "<span class=\"rank\">{}</span><span class=\"name\">{}</span>\
             <span class=\"rating\">{}</span><span class=\"ratio\">{}</span>\
             <span class=\"streak\">{}</span>",
            format_rank(player.rank),
            escape_html(&player.name),
            format_stat(player.rating),
            format_win_ratio(player.wins, player.losses),
            format_streak(player.streak),
        );
    }
    html.push_str("</div>\n");
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Two-letter country code → regional indicator pair.
fn flag_emoji(code: &str) -> Option<String> {
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    code.to_ascii_uppercase()
        .chars()
        .map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{MatchFingerprint, RawGameSnapshot, RawPlayer};
    use cohstats_types::{Faction, GameType, TeamSide};

    fn player(name: &str, ai: bool) -> FullPlayer {
        let raw = if ai {
            RawPlayer::ai(0, name, Faction::Germans)
        } else {
            RawPlayer::human(0, name, "100", Faction::Germans)
        };
        let mut p = FullPlayer::from_raw(&raw, "blue");
        if !ai {
            p.rank = Some(42);
            p.rating = Some(1420);
            p.wins = Some(3);
            p.losses = Some(1);
            p.streak = Some(2);
            p.country = Some("de".into());
        }
        p
    }

    fn view(state: GameState) -> FullGameView {
        FullGameView {
            fingerprint: MatchFingerprint::of(&RawGameSnapshot::default()),
            state,
            game_type: GameType::Custom,
            timestamp: String::new(),
            duration: 0,
            map: "twin_beach_2p".into(),
            win_condition: "VictoryPoint".into(),
            left: FullTeam {
                players: vec![player("<script>alert(1)</script>", false)],
                side: TeamSide::Axis,
            },
            right: FullTeam {
                players: vec![player("CPU", true)],
                side: TeamSide::Axis,
            },
        }
    }

    #[test]
    fn players_shown_during_match() {
        let html = render_overlay(&view(GameState::InGame), &OverlayOptions::default());
        assert!(html.contains("#42"));
        assert!(html.contains("75.0%"));
        assert!(html.contains("+2"));
        assert!(html.contains("<span class=\"ai\">AI</span>"));
    }

    #[test]
    fn names_are_escaped() {
        let html = render_overlay(&view(GameState::InGame), &OverlayOptions::default());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn players_hidden_in_menu_unless_always_show() {
        let menu = view(GameState::Menu);
        let hidden = render_overlay(&menu, &OverlayOptions::default());
        assert!(!hidden.contains("class=\"teams\""));
        assert!(hidden.contains("data-map=\"twin_beach_2p\""));

        let shown = render_overlay(
            &menu,
            &OverlayOptions {
                always_show: true,
                ..Default::default()
            },
        );
        assert!(shown.contains("class=\"teams\""));
    }

    #[test]
    fn flags_are_optional() {
        let v = view(GameState::Loading);
        let without = render_overlay(&v, &OverlayOptions::default());
        assert!(!without.contains("\u{1F1E9}\u{1F1EA}"));

        let with = render_overlay(
            &v,
            &OverlayOptions {
                show_flags: true,
                ..Default::default()
            },
        );
        assert!(with.contains("\u{1F1E9}\u{1F1EA}"));
    }

    #[test]
    fn flag_needs_two_letters() {
        assert_eq!(flag_emoji("de").as_deref(), Some("\u{1F1E9}\u{1F1EA}"));
        assert_eq!(flag_emoji("deu"), None);
        assert_eq!(flag_emoji("1a"), None);
    }
}
