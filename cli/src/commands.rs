use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use cohstats_core::api::{MatchOutcome, MatchPlayer, SortBy, leaderboard_id};
use cohstats_core::config::keys;
use cohstats_core::refine::{FullGameView, FullTeam, GameFoundCue, OverlayWriter};
use cohstats_core::teams::{assign_group_colors, group_players_by_team_relationships};
use cohstats_core::{
    Coh3StatsApi, ConfigContext, ConfigError, GamePoller, GameStateRefiner, LogParser, LogStatus,
    RelicApi, Settings, Transition, WarningsLogParser,
};
use cohstats_types::formatting::{
    format_match_duration, format_rank, format_stat, format_streak, format_win_ratio,
};
use cohstats_types::{LeaderboardMode, Race, TeamSide};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bell::TerminalBell;

pub async fn watch(
    ctx: Arc<ConfigContext>,
    settings: Settings,
    overlay: Option<PathBuf>,
) -> anyhow::Result<()> {
    settings.activate_all(&ctx).await?;

    let mut refiner = GameStateRefiner::new(RelicApi::new()?).with_observer(GameFoundCue::new(
        Arc::clone(&ctx),
        settings.clone(),
        TerminalBell,
    ));
    if let Some(path) = overlay {
        info!(path = %path.display(), "Writing streamer overlay");
        refiner = refiner.with_observer(OverlayWriter::new(Arc::clone(&ctx), settings.clone(), path));
    }

    let interval = Duration::from_millis(settings.poll_interval_ms.get(&ctx).await?);
    let poller = GamePoller::new(Arc::clone(&ctx), settings.clone(), Arc::new(WarningsLogParser));
    let (tx, mut rx) = mpsc::channel(1);
    let poll_task = tokio::spawn(async move { poller.run(interval, tx).await });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut log_found = true;
    loop {
        let Some(status) = until_shutdown(rx.recv(), ctrl_c.as_mut()).await else {
            info!("Stopping");
            break;
        };
        match status {
            Some(LogStatus::Found(snapshot)) => {
                log_found = true;
                let Some(transition) =
                    until_shutdown(refiner.update(&snapshot), ctrl_c.as_mut()).await
                else {
                    info!("Stopping");
                    break;
                };
                if let (Transition::NewMatch | Transition::StateChanged { .. }, Some(view)) =
                    (transition, refiner.view())
                {
                    if transition == Transition::NewMatch {
                        remember_local_player(&ctx, &settings, view, &snapshot.player_steam_id)
                            .await;
                    }
                    print_view(view, transition);
                }
            }
            Some(LogStatus::NotFound) => {
                if log_found {
                    warn!("Game log not found; set it with `config set {} <path>`", keys::LOG_FILE_PATH);
                }
                log_found = false;
            }
            None => break,
        }
    }

    drop(rx);
    match poll_task.await {
        Ok(result) => result?,
        Err(e) => debug!(error = %e, "Poll task ended"),
    }
    Ok(())
}

/// Runs `work` unless `shutdown` completes first.
async fn until_shutdown<T, S>(work: impl Future<Output = T>, shutdown: Pin<&mut S>) -> Option<T>
where
    S: Future,
{
    tokio::select! {
        out = work => Some(out),
        _ = shutdown => None,
    }
}

/// Keep `playerProfileID` pointing at whoever is playing on this machine.
async fn remember_local_player(
    ctx: &ConfigContext,
    settings: &Settings,
    view: &FullGameView,
    steam_id: &str,
) {
    let Some(player) = view.local_player(steam_id) else {
        return;
    };
    let current = settings.player_profile_id.get(ctx).await.ok().flatten();
    if current.as_deref() == Some(player.relic_id.as_str()) {
        return;
    }
    match settings
        .player_profile_id
        .set(ctx, Some(player.relic_id.clone()))
        .await
    {
        Ok(_) => info!(relic_id = %player.relic_id, "Recorded local player"),
        Err(e) => warn!(error = %e, "Failed to record local player"),
    }
}

pub async fn parse(
    ctx: &ConfigContext,
    settings: &Settings,
    path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path,
        None => settings
            .log_file_path
            .get(ctx)
            .await?
            .context("No log file configured and none given")?,
    };
    let snapshot = WarningsLogParser.parse(&path)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

pub async fn config_list(ctx: &ConfigContext, settings: &Settings) -> anyhow::Result<()> {
    for setting in settings.all() {
        println!("{} = {}", setting.key(), setting.get_json(ctx).await?);
    }
    Ok(())
}

pub async fn config_get(ctx: &ConfigContext, settings: &Settings, key: &str) -> anyhow::Result<()> {
    let setting = settings
        .by_key(key)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    println!("{}", setting.get_json(ctx).await?);
    Ok(())
}

pub async fn config_set(
    ctx: &ConfigContext,
    settings: &Settings,
    key: &str,
    raw: &str,
) -> anyhow::Result<()> {
    let setting = settings
        .by_key(key)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    let stored = setting.set_json(ctx, value).await?;
    println!("{} = {}", key, stored);
    Ok(())
}

pub async fn leaderboard(
    mode: LeaderboardMode,
    race: Race,
    start: u32,
    count: u32,
) -> anyhow::Result<()> {
    if !(1..=200).contains(&count) {
        bail!("count must be between 1 and 200");
    }
    let api = RelicApi::new()?;
    let ladders = api
        .leaderboard(leaderboard_id(mode, race), start, count, SortBy::Rating)
        .await?;

    println!("{mode} {race}");
    for stat in &ladders.leaderboard_stats {
        let alias = ladders
            .stat_groups
            .iter()
            .find(|g| g.id == stat.statgroup_id)
            .and_then(|g| g.members.first())
            .map(|m| m.alias.as_str())
            .unwrap_or("?");
        println!(
            "{:>6}  {:<24} {:>5}  {:>6}  {:>3}",
            format_rank(Some(stat.rank)),
            alias,
            stat.rating,
            format_win_ratio(Some(stat.wins), Some(stat.losses)),
            format_streak(Some(stat.streak)),
        );
    }
    Ok(())
}

pub async fn matches(
    ctx: &ConfigContext,
    settings: &Settings,
    profile_id: Option<u64>,
    limit: usize,
) -> anyhow::Result<()> {
    let profile_id = match profile_id {
        Some(id) => id,
        None => settings
            .player_profile_id
            .get(ctx)
            .await?
            .with_context(|| {
                format!("No profile id given and {} is not set", keys::PLAYER_PROFILE_ID)
            })?
            .parse()
            .with_context(|| format!("{} is not a numeric profile id", keys::PLAYER_PROFILE_ID))?,
    };
    let extended = settings.show_extended_info.get(ctx).await?;
    let records = RelicApi::new()?.recent_matches(profile_id).await?;

    if records.is_empty() {
        println!("No recent automatch games");
    }
    for record in records.iter().take(limit) {
        let played = record
            .completed()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let queue = if record.ranked {
            record.mode.to_string()
        } else {
            format!("{} unranked", record.mode)
        };
        let (outcome, rating) = match record.player(profile_id) {
            Some(me) => (outcome_label(me.outcome), rating_label(me, record.ranked)),
            None => ("?", "-".to_string()),
        };
        println!(
            "{}  {:<12} {:<28} {:>6}  {}  {}",
            played,
            queue,
            record.map,
            format_match_duration(record.duration()),
            outcome,
            rating,
        );
        if extended {
            for p in &record.players {
                println!(
                    "    {} {:<24} {:<8} {}  {}",
                    p.team_id,
                    p.alias,
                    p.race.map(|r| r.to_string()).unwrap_or_else(|| "?".into()),
                    outcome_label(p.outcome),
                    rating_label(p, record.ranked),
                );
            }
        }
    }
    Ok(())
}

fn outcome_label(outcome: MatchOutcome) -> &'static str {
    match outcome {
        MatchOutcome::Win => "W",
        MatchOutcome::Loss => "L",
        MatchOutcome::Other(_) => "-",
    }
}

fn rating_label(player: &MatchPlayer, ranked: bool) -> String {
    if !player.is_placed() {
        return "N/A".to_string();
    }
    match (player.old_rating, player.rating_change()) {
        (Some(old), Some(change)) if ranked => format!("{old} ({change:+})"),
        (Some(old), _) => old.to_string(),
        _ => "-".to_string(),
    }
}

pub async fn teams(side: TeamSide, player_ids: &[u64]) -> anyhow::Result<()> {
    let api = Coh3StatsApi::new()?;
    let records = api.teams_among(side, player_ids).await;
    let mut groups = group_players_by_team_relationships(&records, player_ids);
    assign_group_colors(&mut groups);

    if groups.is_empty() {
        println!("No arranged teams");
    }
    for group in &groups {
        let ids: Vec<String> = group.player_ids.iter().map(u64::to_string).collect();
        println!("[{}] {}", group.color.as_deref().unwrap_or("-"), ids.join(", "));
        for team in &group.teams {
            println!(
                "    {:<24} elo {:>5}  {}",
                team.id,
                team.elo,
                format_win_ratio(Some(team.wins), Some(team.losses)),
            );
        }
    }
    Ok(())
}

fn print_view(view: &FullGameView, transition: Transition) {
    match transition {
        Transition::StateChanged { from, to } => {
            println!("{} -> {} ({})", from, to, format_match_duration(view.duration));
        }
        _ => {
            println!("== {} | {} | {} ==", view.map, view.win_condition, view.state);
            print_team(&view.left);
            println!("   vs");
            print_team(&view.right);
        }
    }
}

fn print_team(team: &FullTeam) {
    for p in &team.players {
        if p.ai {
            println!("  {:<24} AI", p.name);
            continue;
        }
        println!(
            "  {:<24} {:>6}  {:>5}  {:>6}  {:>3}  {}",
            p.name,
            format_rank(p.rank),
            format_stat(p.rating),
            format_win_ratio(p.wins, p.losses),
            format_streak(p.streak),
            p.country.as_deref().unwrap_or(""),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohstats_core::api::{Ladders, StatsApi};
    use cohstats_core::{ApiError, RawGameSnapshot, RawPlayer, RawTeam};
    use cohstats_types::{Faction, GameState};
    use tokio::sync::oneshot;

    /// Never answers, like a request stuck until its timeout.
    struct StalledApi;

    impl StatsApi for StalledApi {
        async fn personal_stats(&self, _relic_id: &str) -> Result<Ladders, ApiError> {
            std::future::pending().await
        }
    }

    fn loading_snapshot() -> RawGameSnapshot {
        RawGameSnapshot {
            game_state: GameState::Loading,
            map: "twin_beach_2p".into(),
            left: RawTeam::from_players(vec![RawPlayer::human(0, "Tester", "100", Faction::Germans)]),
            right: RawTeam::from_players(vec![RawPlayer::human(1, "Rival", "200", Faction::Americans)]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn shutdown_interrupts_refinement_in_flight() {
        let mut refiner = GameStateRefiner::new(StalledApi);
        let snapshot = loading_snapshot();
        let (stop, stopped) = oneshot::channel::<()>();
        tokio::pin!(stopped);

        tokio::spawn(async move {
            tokio::task::yield_now().await;
            let _ = stop.send(());
        });

        let outcome = until_shutdown(refiner.update(&snapshot), stopped.as_mut()).await;
        assert_eq!(outcome, None);
        assert!(refiner.view().is_none());
    }

    #[tokio::test]
    async fn work_finishing_first_is_returned() {
        let shutdown = std::future::pending::<()>();
        tokio::pin!(shutdown);
        assert_eq!(until_shutdown(async { 7 }, shutdown.as_mut()).await, Some(7));
    }

    fn player(wins: i64, losses: i64) -> MatchPlayer {
        MatchPlayer {
            profile_id: 1,
            alias: "Tester".into(),
            country: None,
            race: None,
            team_id: 0,
            outcome: MatchOutcome::Win,
            old_rating: Some(1400),
            new_rating: Some(1384),
            wins: Some(wins),
            losses: Some(losses),
        }
    }

    #[test]
    fn rating_label_shows_change_for_placed_ranked_players() {
        assert_eq!(rating_label(&player(10, 5), true), "1400 (-16)");
        assert_eq!(rating_label(&player(10, 5), false), "1400");
        assert_eq!(rating_label(&player(3, 2), true), "N/A");
    }
}
