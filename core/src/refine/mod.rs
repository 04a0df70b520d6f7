//! Raw snapshot → enriched match view.

mod observers;
mod refiner;
mod view;

pub use observers::{AudioCue, GameFoundCue, OverlayWriter, RefinerObserver};
pub use refiner::{GameStateRefiner, LEFT_COLORS, RIGHT_COLORS, Transition};
pub use view::{FullGameView, FullPlayer, FullTeam, WinLoss};
