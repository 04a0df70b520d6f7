use cohstats_types::{LeaderboardMode, Race};

/// Relic ladder id for a mode and race.
pub fn leaderboard_id(mode: LeaderboardMode, race: Race) -> u64 {
    use LeaderboardMode::*;
    use Race::*;

    match (mode, race) {
        (OneVsOne, German) => 2130255,
        (OneVsOne, American) => 2130257,
        (OneVsOne, Dak) => 2130259,
        (OneVsOne, British) => 2130261,
        (TwoVsTwo, German) => 2130300,
        (TwoVsTwo, American) => 2130302,
        (TwoVsTwo, Dak) => 2130304,
        (TwoVsTwo, British) => 2130306,
        (ThreeVsThree, German) => 2130301,
        (ThreeVsThree, American) => 2130303,
        (ThreeVsThree, Dak) => 2130305,
        (ThreeVsThree, British) => 2130307,
        (FourVsFour, German) => 2130329,
        (FourVsFour, American) => 2130331,
        (FourVsFour, Dak) => 2130333,
        (FourVsFour, British) => 2130335,
    }
}

/// Mode and race of a known ladder id.
pub fn leaderboard_slot(id: u64) -> Option<(LeaderboardMode, Race)> {
    LeaderboardMode::ALL
        .into_iter()
        .flat_map(|mode| Race::ALL.into_iter().map(move |race| (mode, race)))
        .find(|(mode, race)| leaderboard_id(*mode, *race) == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids() {
        assert_eq!(leaderboard_id(LeaderboardMode::OneVsOne, Race::German), 2130255);
        assert_eq!(leaderboard_id(LeaderboardMode::FourVsFour, Race::British), 2130335);
        assert_eq!(leaderboard_id(LeaderboardMode::TwoVsTwo, Race::Dak), 2130304);
    }

    #[test]
    fn every_id_maps_back_to_its_slot() {
        for mode in LeaderboardMode::ALL {
            for race in Race::ALL {
                let id = leaderboard_id(mode, race);
                assert_eq!(leaderboard_slot(id), Some((mode, race)));
            }
        }
    }

    #[test]
    fn unknown_id_has_no_slot() {
        assert_eq!(leaderboard_slot(1), None);
    }
}
