use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    #[serde(alias = "autumn")]
    Fall,
    Winter,
}

impl Season {
    pub const CYCLE: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    /// Season in effect during `round` (1-based), each season lasting
    /// `rounds_per_season` rounds.
    pub fn from_round(round: u64, rounds_per_season: u64) -> Season {
        let per_season = rounds_per_season.max(1);
        let index = (round.saturating_sub(1) / per_season) % Self::CYCLE.len() as u64;
        Self::CYCLE[index as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Producer growth and mortality multipliers for one season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonModifiers {
    pub growth: f64,
    pub mortality: f64,
}

impl SeasonModifiers {
    pub const NEUTRAL: SeasonModifiers = SeasonModifiers {
        growth: 1.0,
        mortality: 1.0,
    };
}

pub type SeasonTable = BTreeMap<Season, SeasonModifiers>;

pub fn default_season_table() -> SeasonTable {
    BTreeMap::from([
        (
            Season::Spring,
            SeasonModifiers {
                growth: 1.5,
                mortality: 0.5,
            },
        ),
        (
            Season::Summer,
            SeasonModifiers {
                growth: 1.0,
                mortality: 1.0,
            },
        ),
        (
            Season::Fall,
            SeasonModifiers {
                growth: 0.7,
                mortality: 1.3,
            },
        ),
        (
            Season::Winter,
            SeasonModifiers {
                growth: 0.3,
                mortality: 5.0,
            },
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seasons_cycle_every_rounds_per_season() {
        let seasons: Vec<Season> = (1..=13).map(|round| Season::from_round(round, 3)).collect();
        assert_eq!(
            seasons,
            vec![
                Season::Spring,
                Season::Spring,
                Season::Spring,
                Season::Summer,
                Season::Summer,
                Season::Summer,
                Season::Fall,
                Season::Fall,
                Season::Fall,
                Season::Winter,
                Season::Winter,
                Season::Winter,
                Season::Spring,
            ]
        );
    }

    #[test]
    fn single_round_seasons_and_zero_guard() {
        assert_eq!(Season::from_round(2, 1), Season::Summer);
        assert_eq!(Season::from_round(4, 1), Season::Winter);
        assert_eq!(Season::from_round(5, 0), Season::Spring);
    }

    #[test]
    fn default_table_covers_every_season() {
        let table = default_season_table();
        for season in Season::CYCLE {
            assert!(table.contains_key(&season), "{season} missing");
        }
        assert_eq!(table[&Season::Winter].mortality, 5.0);
    }
}
