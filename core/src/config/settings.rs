//! Catalogue of application settings.
//!
//! Keys match the ones the desktop app has always written to `config.dat`,
//! so an existing settings file keeps working.

use std::path::{Path, PathBuf};

use cohstats_types::MapView;

use super::value::{ConfigContext, ConfigValue, DynSetting};
use crate::error::Result;

pub mod keys {
    pub const LOG_FILE_PATH: &str = "logFilePath";
    pub const PLAYBACK_PATH: &str = "playbackPath";
    pub const AUTO_SYNC_REPLAYS: &str = "autoSyncReplays";
    pub const MAP_VIEW: &str = "mapViewSettings";
    pub const SHOW_EXTENDED_INFO: &str = "showExtendedInfo";
    pub const PLAYER_PROFILE_ID: &str = "playerProfileID";
    pub const PLAY_SOUND: &str = "playSound";
    pub const PLAY_SOUND_VOLUME: &str = "playSoundVolume";
    pub const STREAMER_OVERLAY_ENABLED: &str = "streamerOverlayEnabled";
    pub const SHOW_FLAGS_OVERLAY: &str = "showFlagsOverlay";
    pub const ALWAYS_SHOW_OVERLAY: &str = "alwaysShowOverlay";
    pub const POLL_INTERVAL_MS: &str = "logPollIntervalMs";
}

const DEFAULT_VOLUME: f32 = 0.8;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// `Documents/My Games/Company of Heroes 3`
pub fn default_game_dir() -> Option<PathBuf> {
    dirs::document_dir().map(|p| p.join("My Games").join("Company of Heroes 3"))
}

/// Every setting the application reads or writes.
#[derive(Clone)]
pub struct Settings {
    pub log_file_path: ConfigValue<Option<PathBuf>>,
    pub playback_path: ConfigValue<Option<PathBuf>>,
    pub auto_sync_replays: ConfigValue<bool>,
    pub map_view: ConfigValue<MapView>,
    pub show_extended_info: ConfigValue<bool>,
    pub player_profile_id: ConfigValue<Option<String>>,
    pub play_sound: ConfigValue<bool>,
    pub play_sound_volume: ConfigValue<f32>,
    pub streamer_overlay_enabled: ConfigValue<bool>,
    pub show_flags_overlay: ConfigValue<bool>,
    pub always_show_overlay: ConfigValue<bool>,
    pub poll_interval_ms: ConfigValue<u64>,
}

impl Settings {
    /// Settings whose path defaults point into the user's documents folder.
    pub fn new() -> Self {
        Self::with_game_dir(default_game_dir())
    }

    /// Settings whose path defaults point into `game_dir`.
    pub fn with_game_dir(game_dir: Option<PathBuf>) -> Self {
        let log_default = game_dir.as_ref().map(|d| d.join("warnings.log"));
        let playback_default = game_dir.as_ref().map(|d| d.join("playback"));

        Self {
            log_file_path: existing_path_setting(keys::LOG_FILE_PATH, log_default),
            playback_path: existing_path_setting(keys::PLAYBACK_PATH, playback_default),
            auto_sync_replays: ConfigValue::with_default(keys::AUTO_SYNC_REPLAYS, false),
            map_view: ConfigValue::with_default(keys::MAP_VIEW, MapView::Default),
            show_extended_info: ConfigValue::with_default(keys::SHOW_EXTENDED_INFO, false),
            player_profile_id: ConfigValue::with_default(keys::PLAYER_PROFILE_ID, None),
            play_sound: ConfigValue::with_default(keys::PLAY_SOUND, true),
            play_sound_volume: ConfigValue::with_default(keys::PLAY_SOUND_VOLUME, DEFAULT_VOLUME)
                .validated(|volume: f32, _, default| async move {
                    Ok(if volume.is_finite() {
                        volume.clamp(0.0, 1.0)
                    } else {
                        default
                    })
                }),
            streamer_overlay_enabled: ConfigValue::with_default(keys::STREAMER_OVERLAY_ENABLED, false),
            show_flags_overlay: ConfigValue::with_default(keys::SHOW_FLAGS_OVERLAY, false),
            always_show_overlay: ConfigValue::with_default(keys::ALWAYS_SHOW_OVERLAY, false),
            poll_interval_ms: ConfigValue::with_default(keys::POLL_INTERVAL_MS, DEFAULT_POLL_INTERVAL_MS)
                .validated(|interval: u64, _, default| async move {
                    Ok(if interval == 0 { default } else { interval })
                }),
        }
    }

    /// All settings, for key-addressed access.
    pub fn all(&self) -> Vec<&dyn DynSetting> {
        let all: [&dyn DynSetting; 12] = [
            &self.log_file_path,
            &self.playback_path,
            &self.auto_sync_replays,
            &self.map_view,
            &self.show_extended_info,
            &self.player_profile_id,
            &self.play_sound,
            &self.play_sound_volume,
            &self.streamer_overlay_enabled,
            &self.show_flags_overlay,
            &self.always_show_overlay,
            &self.poll_interval_ms,
        ];
        all.to_vec()
    }

    pub fn by_key(&self, key: &str) -> Option<&dyn DynSetting> {
        self.all().into_iter().find(|s| s.key() == key)
    }

    /// Activate every setting so the store holds validated values.
    pub async fn activate_all(&self, ctx: &ConfigContext) -> Result<()> {
        for setting in self.all() {
            setting.activate(ctx).await?;
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// A path setting that only ever holds a path that exists on disk.
///
/// The stored path wins if it still exists, then the default; otherwise the
/// setting is cleared. A cleared setting is persisted as `null`, which the
/// store treats as absent, so a plain `get` reads back the default path even
/// when it does not exist. Subscribers see the validated value (`None`).
fn existing_path_setting(key: &'static str, default: Option<PathBuf>) -> ConfigValue<Option<PathBuf>> {
    ConfigValue::with_default(key, default).validated(|value, _, default| async move {
        if path_exists(value.as_deref()).await {
            return Ok(value);
        }
        if path_exists(default.as_deref()).await {
            return Ok(default);
        }
        Ok(None)
    })
}

async fn path_exists(path: Option<&Path>) -> bool {
    match path {
        Some(p) => tokio::fs::try_exists(p).await.unwrap_or(false),
        None => false,
    }
}
