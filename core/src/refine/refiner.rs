use cohstats_types::{GameState, LeaderboardMode};
use futures_util::future::{join, join_all};
use tracing::{debug, info, warn};

use super::observers::RefinerObserver;
use super::view::{FullGameView, FullPlayer, FullTeam};
use crate::api::StatsApi;
use crate::game::{MatchFingerprint, RawGameSnapshot, RawPlayer, RawTeam};

pub const LEFT_COLORS: [&str; 4] = ["blue", "blue", "blue", "blue"];
pub const RIGHT_COLORS: [&str; 4] = ["pink", "green", "red", "purple"];

/// What an [`GameStateRefiner::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A different match was seen and its players were fetched.
    NewMatch,
    /// Same match, new game state. Nothing was fetched.
    StateChanged { from: GameState, to: GameState },
    Unchanged,
    /// A different match was seen but no player could be fetched. The
    /// previous view is kept and the match is retried on the next update.
    Failed,
}

impl Transition {
    /// The state the view moved into, if it moved at all.
    pub fn entered(&self, view: &FullGameView) -> Option<GameState> {
        match self {
            Transition::NewMatch => Some(view.state),
            Transition::StateChanged { to, .. } => Some(*to),
            Transition::Unchanged | Transition::Failed => None,
        }
    }
}

#[derive(Default)]
struct FetchTally {
    attempted: usize,
    succeeded: usize,
}

/// Keeps the enriched view of the current match in step with the log.
///
/// Player stats are fetched once per match: repeated snapshots of the same
/// match only update the game state.
pub struct GameStateRefiner<A> {
    api: A,
    fingerprint: Option<MatchFingerprint>,
    view: Option<FullGameView>,
    observers: Vec<Box<dyn RefinerObserver>>,
}

impl<A: StatsApi> GameStateRefiner<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            fingerprint: None,
            view: None,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: impl RefinerObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn view(&self) -> Option<&FullGameView> {
        self.view.as_ref()
    }

    pub fn fingerprint(&self) -> Option<&MatchFingerprint> {
        self.fingerprint.as_ref()
    }

    pub async fn update(&mut self, snapshot: &RawGameSnapshot) -> Transition {
        let fingerprint = MatchFingerprint::of(snapshot);
        let same_match = self.fingerprint.as_ref() == Some(&fingerprint);

        let transition = match self.view.as_mut() {
            Some(view) if same_match => {
                if view.state == snapshot.game_state {
                    return Transition::Unchanged;
                }
                let from = view.state;
                view.state = snapshot.game_state;
                debug!(%from, to = %view.state, "Game state changed");
                Transition::StateChanged {
                    from,
                    to: snapshot.game_state,
                }
            }
            _ => match self.refine(snapshot, fingerprint.clone()).await {
                Some(view) => {
                    info!(
                        map = %view.map,
                        state = %view.state,
                        players = view.players().count(),
                        "New match"
                    );
                    self.view = Some(view);
                    self.fingerprint = Some(fingerprint);
                    Transition::NewMatch
                }
                None => return Transition::Failed,
            },
        };

        self.notify(transition).await;
        transition
    }

    async fn notify(&self, transition: Transition) {
        let Some(view) = self.view.as_ref() else {
            return;
        };
        for observer in &self.observers {
            if let Err(e) = observer.on_transition(view, &transition).await {
                warn!(error = %e, "Refiner observer failed");
            }
        }
    }

    async fn refine(
        &self,
        snapshot: &RawGameSnapshot,
        fingerprint: MatchFingerprint,
    ) -> Option<FullGameView> {
        let ((left, left_tally), (right, right_tally)) = join(
            self.refine_side(&snapshot.left, &LEFT_COLORS),
            self.refine_side(&snapshot.right, &RIGHT_COLORS),
        )
        .await;

        let attempted = left_tally.attempted + right_tally.attempted;
        let succeeded = left_tally.succeeded + right_tally.succeeded;
        if attempted > 0 && succeeded == 0 {
            warn!(players = attempted, "Could not fetch any player stats; keeping previous view");
            return None;
        }

        Some(FullGameView {
            fingerprint,
            state: snapshot.game_state,
            game_type: snapshot.game_type,
            timestamp: snapshot.timestamp.clone(),
            duration: snapshot.duration,
            map: snapshot.map.clone(),
            win_condition: snapshot.win_condition.clone(),
            left,
            right,
        })
    }

    async fn refine_side(&self, team: &RawTeam, colors: &[&str]) -> (FullTeam, FetchTally) {
        let mode = LeaderboardMode::from_team_size(team.players.len());
        let humans: Vec<&RawPlayer> = team.players.iter().filter(|p| !p.ai).collect();

        let responses = join_all(
            humans
                .iter()
                .map(|p| self.api.personal_stats(&p.relic_id)),
        )
        .await;

        let mut players: Vec<FullPlayer> = team
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| FullPlayer::from_raw(p, colors[i % colors.len()]))
            .collect();

        let mut tally = FetchTally {
            attempted: humans.len(),
            succeeded: 0,
        };
        for (raw, response) in humans.iter().zip(responses) {
            match response {
                Ok(ladders) => {
                    tally.succeeded += 1;
                    for player in players
                        .iter_mut()
                        .filter(|p| !p.ai && p.relic_id == raw.relic_id)
                    {
                        player.apply_stats(&ladders, mode);
                    }
                }
                Err(e) => {
                    warn!(relic_id = %raw.relic_id, error = %e, "Failed to fetch player stats");
                }
            }
        }

        (
            FullTeam {
                players,
                side: team.side,
            },
            tally,
        )
    }
}
