use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use cohstats_core::{ConfigContext, ConfigStore, Settings};
use cohstats_types::{LeaderboardMode, Race, TeamSide};
use tracing_subscriber::EnvFilter;

mod bell;
mod commands;

#[derive(Parser)]
#[command(version, about = "Live match stats for Company of Heroes 3")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the game log and print each new match
    Watch {
        /// Also write the streamer overlay page here
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
    /// Parse a log file once and print the snapshot as JSON
    Parse {
        /// Log file (defaults to the configured one)
        path: Option<PathBuf>,
    },
    /// Read or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show one page of a ranked ladder
    Leaderboard {
        mode: LeaderboardMode,
        race: Race,
        #[arg(long, default_value_t = 1)]
        start: u32,
        #[arg(long, default_value_t = 20)]
        count: u32,
    },
    /// List a player's recent automatch games
    Matches {
        /// Relic profile id (defaults to the playerProfileID setting)
        profile_id: Option<u64>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Find arranged teams among players on one side
    Teams {
        side: TeamSide,
        #[arg(required = true, num_args = 2..)]
        player_ids: Vec<u64>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    List,
    Get { key: String },
    /// VALUE is JSON; anything that is not valid JSON is stored as a string
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let path = match cli.config {
        Some(path) => path,
        None => ConfigStore::default_path()?,
    };
    let ctx = Arc::new(ConfigContext::new(ConfigStore::open(path).await?));
    let settings = Settings::new();

    match cli.command {
        Commands::Watch { overlay } => commands::watch(ctx, settings, overlay).await,
        Commands::Parse { path } => commands::parse(&ctx, &settings, path).await,
        Commands::Config { action } => match action {
            ConfigAction::List => commands::config_list(&ctx, &settings).await,
            ConfigAction::Get { key } => commands::config_get(&ctx, &settings, &key).await,
            ConfigAction::Set { key, value } => {
                commands::config_set(&ctx, &settings, &key, &value).await
            }
        },
        Commands::Leaderboard {
            mode,
            race,
            start,
            count,
        } => commands::leaderboard(mode, race, start, count).await,
        Commands::Matches { profile_id, limit } => {
            commands::matches(&ctx, &settings, profile_id, limit).await
        }
        Commands::Teams { side, player_ids } => commands::teams(side, &player_ids).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    // COHSTATS_LOG_PATH redirects logs to a file (appended)
    if let Ok(path) = std::env::var("COHSTATS_LOG_PATH") {
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
            return;
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
