use std::path::PathBuf;
use std::sync::Arc;

use cohstats_types::GameState;
use futures_util::future::BoxFuture;
use tracing::debug;

use super::refiner::Transition;
use super::view::FullGameView;
use crate::config::{ConfigContext, Settings};
use crate::error::Result;
use crate::overlay::{OverlayOptions, render_overlay};

/// Called after every [`Transition::NewMatch`] and [`Transition::StateChanged`].
///
/// Errors are logged by the refiner and otherwise ignored.
pub trait RefinerObserver: Send + Sync {
    fn on_transition<'a>(
        &'a self,
        view: &'a FullGameView,
        transition: &'a Transition,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Rewrites the streamer overlay file while the overlay is enabled.
pub struct OverlayWriter {
    ctx: Arc<ConfigContext>,
    settings: Settings,
    path: PathBuf,
}

impl OverlayWriter {
    pub fn new(ctx: Arc<ConfigContext>, settings: Settings, path: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            settings,
            path: path.into(),
        }
    }

    async fn write(&self, view: &FullGameView) -> Result<()> {
        if !self.settings.streamer_overlay_enabled.get(&self.ctx).await? {
            return Ok(());
        }
        let options = OverlayOptions {
            show_flags: self.settings.show_flags_overlay.get(&self.ctx).await?,
            always_show: self.settings.always_show_overlay.get(&self.ctx).await?,
        };
        let html = render_overlay(view, &options);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, html).await?;
        debug!(path = %self.path.display(), "Overlay written");
        Ok(())
    }
}

impl RefinerObserver for OverlayWriter {
    fn on_transition<'a>(
        &'a self,
        view: &'a FullGameView,
        _transition: &'a Transition,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.write(view))
    }
}

/// Something that can make a "match found" noise.
pub trait AudioCue: Send + Sync {
    /// `volume` is in `0.0..=1.0`.
    fn play(&self, volume: f32) -> Result<()>;
}

/// Plays the cue when a match starts loading, if sounds are enabled.
pub struct GameFoundCue<C> {
    ctx: Arc<ConfigContext>,
    settings: Settings,
    cue: C,
}

impl<C: AudioCue> GameFoundCue<C> {
    pub fn new(ctx: Arc<ConfigContext>, settings: Settings, cue: C) -> Self {
        Self { ctx, settings, cue }
    }

    async fn maybe_play(&self, view: &FullGameView, transition: &Transition) -> Result<()> {
        if transition.entered(view) != Some(GameState::Loading) {
            return Ok(());
        }
        if !self.settings.play_sound.get(&self.ctx).await? {
            return Ok(());
        }
        let volume = self.settings.play_sound_volume.get(&self.ctx).await?;
        debug!(volume, "Match found");
        self.cue.play(volume.clamp(0.0, 1.0))
    }
}

impl<C: AudioCue> RefinerObserver for GameFoundCue<C> {
    fn on_transition<'a>(
        &'a self,
        view: &'a FullGameView,
        transition: &'a Transition,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.maybe_play(view, transition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigStore, keys};
    use crate::game::{MatchFingerprint, RawGameSnapshot};
    use crate::refine::view::FullTeam;
    use std::sync::Mutex;

    fn view(state: GameState) -> FullGameView {
        FullGameView {
            fingerprint: MatchFingerprint::of(&RawGameSnapshot::default()),
            state,
            game_type: Default::default(),
            timestamp: String::new(),
            duration: 0,
            map: "twin_beach_2p".into(),
            win_condition: String::new(),
            left: FullTeam::default(),
            right: FullTeam::default(),
        }
    }

    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<f32>>>);

    impl AudioCue for Recorded {
        fn play(&self, volume: f32) -> Result<()> {
            self.0.lock().unwrap().push(volume);
            Ok(())
        }
    }

    fn ctx() -> Arc<ConfigContext> {
        Arc::new(ConfigContext::new(ConfigStore::in_memory()))
    }

    #[tokio::test]
    async fn cue_plays_on_entering_loading() {
        let ctx = ctx();
        let played = Recorded::default();
        let cue = GameFoundCue::new(ctx, Settings::with_game_dir(None), played.clone());

        let loading = view(GameState::Loading);
        cue.on_transition(&loading, &Transition::NewMatch).await.unwrap();

        let in_game = view(GameState::InGame);
        let started = Transition::StateChanged {
            from: GameState::Loading,
            to: GameState::InGame,
        };
        cue.on_transition(&in_game, &started).await.unwrap();

        assert_eq!(*played.0.lock().unwrap(), vec![0.8]);
    }

    #[tokio::test]
    async fn cue_respects_play_sound() {
        let ctx = ctx();
        let settings = Settings::with_game_dir(None);
        settings.play_sound.set(&ctx, false).await.unwrap();
        let played = Recorded::default();
        let cue = GameFoundCue::new(ctx, settings, played.clone());

        cue.on_transition(&view(GameState::Loading), &Transition::NewMatch)
            .await
            .unwrap();
        assert!(played.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn overlay_written_only_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay").join("index.html");
        let ctx = ctx();
        let settings = Settings::with_game_dir(None);
        let writer = OverlayWriter::new(Arc::clone(&ctx), settings.clone(), &path);

        writer
            .on_transition(&view(GameState::Loading), &Transition::NewMatch)
            .await
            .unwrap();
        assert!(!path.exists());

        ctx.store().set(keys::STREAMER_OVERLAY_ENABLED, &true).unwrap();
        writer
            .on_transition(&view(GameState::Loading), &Transition::NewMatch)
            .await
            .unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("twin_beach_2p"));
    }
}
