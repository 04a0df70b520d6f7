pub mod api;
pub mod config;
pub mod error;
pub mod game;
pub mod log;
pub mod overlay;
pub mod poller;
pub mod refine;
pub mod teams;

// Re-exports for convenience
pub use api::{Coh3StatsApi, RelicApi, StatsApi};
pub use config::{ConfigContext, ConfigStore, ConfigValue, Settings};
pub use error::{ApiError, ConfigError, Error, LogParseError, Result};
pub use game::{LogStatus, MatchFingerprint, RawGameSnapshot, RawPlayer, RawTeam};
pub use log::{LogParser, WarningsLogParser};
pub use poller::GamePoller;
pub use refine::{FullGameView, GameStateRefiner, Transition};
pub use teams::{KnownFriendsGroup, TeamRecord};
