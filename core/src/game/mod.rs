//! Raw match data read from the game log.

mod fingerprint;
mod snapshot;

pub use fingerprint::MatchFingerprint;
pub use snapshot::{LogStatus, RawGameSnapshot, RawPlayer, RawTeam};
