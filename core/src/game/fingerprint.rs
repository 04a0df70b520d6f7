//! Stable identity of a match across polling ticks.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::RawGameSnapshot;

/// Fields are joined with the ASCII unit separator, which never appears in
/// log values, so two different field splits can't produce the same string.
const FIELD_SEPARATOR: char = '\u{1f}';

/// Timestamp, map, win condition and every relic id in roster order.
///
/// Equal fingerprints mean the same logical match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchFingerprint(String);

impl MatchFingerprint {
    pub fn of(snapshot: &RawGameSnapshot) -> Self {
        let relic_ids = snapshot
            .players()
            .map(|p| p.relic_id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let mut s = String::with_capacity(
            snapshot.timestamp.len() + snapshot.map.len() + snapshot.win_condition.len() + relic_ids.len() + 3,
        );
        for (i, field) in [
            snapshot.timestamp.as_str(),
            snapshot.map.as_str(),
            snapshot.win_condition.as_str(),
            relic_ids.as_str(),
        ]
        .into_iter()
        .enumerate()
        {
            if i > 0 {
                s.push(FIELD_SEPARATOR);
            }
            s.push_str(field);
        }
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.replace(FIELD_SEPARATOR, "|"))
    }
}
