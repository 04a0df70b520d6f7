//! Game log reading.
//!
//! The game writes everything we need about the current match into
//! `warnings.log`. The [`LogParser`] trait is the seam between the refiner
//! and whatever produces snapshots; [`WarningsLogParser`] reads the real file.

mod parser;

pub use parser::{WarningsLogParser, parse_log};

use std::path::Path;

use crate::error::LogParseError;
use crate::game::RawGameSnapshot;

pub trait LogParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<RawGameSnapshot, LogParseError>;
}
