use std::fmt;

use serde::{Deserialize, Serialize};

/// Ecological rank of a trophic level, producers first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrophicRank {
    Producer,
    #[serde(alias = "herbivore")]
    PrimaryConsumer,
    #[serde(alias = "primary_carnivore")]
    SecondaryConsumer,
    #[serde(alias = "secondary_carnivore")]
    TertiaryConsumer,
}

impl TrophicRank {
    pub const ALL: [TrophicRank; 4] = [
        TrophicRank::Producer,
        TrophicRank::PrimaryConsumer,
        TrophicRank::SecondaryConsumer,
        TrophicRank::TertiaryConsumer,
    ];

    pub fn priority(self) -> usize {
        match self {
            TrophicRank::Producer => 0,
            TrophicRank::PrimaryConsumer => 1,
            TrophicRank::SecondaryConsumer => 2,
            TrophicRank::TertiaryConsumer => 3,
        }
    }

    pub fn from_priority(priority: usize) -> Option<Self> {
        Self::ALL.get(priority).copied()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TrophicRank::Producer => "Producers",
            TrophicRank::PrimaryConsumer => "Primary Consumers",
            TrophicRank::SecondaryConsumer => "Secondary Consumers",
            TrophicRank::TertiaryConsumer => "Tertiary Consumers",
        }
    }

    /// Growth rate handed to species that do not specify one.
    pub fn default_growth_rate(self) -> f64 {
        match self {
            TrophicRank::Producer => 0.10,
            TrophicRank::PrimaryConsumer => 0.05,
            TrophicRank::SecondaryConsumer => 0.03,
            TrophicRank::TertiaryConsumer => 0.01,
        }
    }
}

impl fmt::Display for TrophicRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Static per-kind metadata. Only the trophic tag changes, and only when the
/// species is registered with a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    name: String,
    energy_per_individual: f64,
    biomass_per_individual: f64,
    rank: TrophicRank,
}

impl Species {
    pub fn new(
        name: impl Into<String>,
        energy_per_individual: f64,
        biomass_per_individual: f64,
        rank: TrophicRank,
    ) -> Self {
        Self {
            name: name.into(),
            energy_per_individual: energy_per_individual.max(0.0),
            biomass_per_individual: biomass_per_individual.max(0.0),
            rank,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn energy_per_individual(&self) -> f64 {
        self.energy_per_individual
    }

    pub fn biomass_per_individual(&self) -> f64 {
        self.biomass_per_individual
    }

    pub fn rank(&self) -> TrophicRank {
        self.rank
    }

    pub(crate) fn tag(&mut self, rank: TrophicRank) {
        self.rank = rank;
    }

    /// Weighted biomass/energy score of `population` individuals.
    pub fn score(&self, population: f64) -> f64 {
        const BIOMASS_WEIGHT: f64 = 0.5;
        const ENERGY_WEIGHT: f64 = 0.5;
        BIOMASS_WEIGHT * population * self.biomass_per_individual
            + ENERGY_WEIGHT * population * self.energy_per_individual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_ordered_by_priority() {
        for (index, rank) in TrophicRank::ALL.iter().enumerate() {
            assert_eq!(rank.priority(), index);
            assert_eq!(TrophicRank::from_priority(index), Some(*rank));
        }
        assert!(TrophicRank::Producer < TrophicRank::TertiaryConsumer);
        assert_eq!(TrophicRank::from_priority(4), None);
    }

    #[test]
    fn score_weights_biomass_and_energy_evenly() {
        let rabbit = Species::new("Rabbit", 4.0, 0.5, TrophicRank::PrimaryConsumer);
        assert!((rabbit.score(200.0) - (0.5 * 200.0 * 0.5 + 0.5 * 200.0 * 4.0)).abs() < 1e-9);
        assert_eq!(rabbit.score(0.0), 0.0);
    }

    #[test]
    fn negative_per_individual_values_are_clamped() {
        let odd = Species::new("Odd", -1.0, -2.0, TrophicRank::Producer);
        assert_eq!(odd.energy_per_individual(), 0.0);
        assert_eq!(odd.biomass_per_individual(), 0.0);
    }

    #[test]
    fn consumer_level_aliases_deserialize() {
        let rank: TrophicRank = serde_yaml::from_str("herbivore").unwrap();
        assert_eq!(rank, TrophicRank::PrimaryConsumer);
        let rank: TrophicRank = serde_yaml::from_str("tertiary_consumer").unwrap();
        assert_eq!(rank, TrophicRank::TertiaryConsumer);
    }
}
