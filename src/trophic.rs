use std::collections::BTreeMap;

use crate::{
    error::SimulationError,
    population::Population,
    species::{Species, TrophicRank},
};

/// Bucket of species sharing one ecological rank.
///
/// Species and their populations are stored side by side and are only ever
/// inserted together, so both maps always share the same key set.
#[derive(Debug, Clone, PartialEq)]
pub struct TrophicLevel {
    name: String,
    rank: TrophicRank,
    ideal_ratio: f64,
    cap: Option<f64>,
    species: BTreeMap<String, Species>,
    populations: BTreeMap<String, Population>,
}

impl TrophicLevel {
    pub fn new(rank: TrophicRank, ideal_ratio: f64) -> Result<Self, SimulationError> {
        let mut level = Self {
            name: rank.display_name().to_string(),
            rank,
            ideal_ratio: 1.0,
            cap: None,
            species: BTreeMap::new(),
            populations: BTreeMap::new(),
        };
        level.set_ideal_ratio(ideal_ratio)?;
        Ok(level)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> TrophicRank {
        self.rank
    }

    pub fn priority(&self) -> usize {
        self.rank.priority()
    }

    pub fn ideal_ratio(&self) -> f64 {
        self.ideal_ratio
    }

    pub fn set_ideal_ratio(&mut self, ideal_ratio: f64) -> Result<(), SimulationError> {
        if !(ideal_ratio.is_finite() && ideal_ratio > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "{} ideal ratio must be positive, got {ideal_ratio}",
                self.name
            )));
        }
        self.ideal_ratio = ideal_ratio;
        Ok(())
    }

    /// Designer-supplied ceiling. Carried as data only; nothing enforces it.
    pub fn cap(&self) -> Option<f64> {
        self.cap
    }

    pub fn set_cap(&mut self, cap: Option<f64>) {
        self.cap = cap;
    }

    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.values()
    }

    pub fn populations(&self) -> impl Iterator<Item = &Population> {
        self.populations.values()
    }

    pub fn species_names(&self) -> Vec<String> {
        self.species.keys().cloned().collect()
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    pub fn population_count(&self) -> usize {
        self.populations.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.species.contains_key(name)
    }

    pub fn species_by_name(&self, name: &str) -> Option<&Species> {
        self.species.get(name)
    }

    pub fn population(&self, name: &str) -> Option<&Population> {
        self.populations.get(name)
    }

    pub(crate) fn population_mut(&mut self, name: &str) -> Option<&mut Population> {
        self.populations.get_mut(name)
    }

    pub(crate) fn populations_mut(&mut self) -> impl Iterator<Item = &mut Population> {
        self.populations.values_mut()
    }

    /// Sum of current head counts across member species.
    pub fn total_population(&self) -> f64 {
        self.populations.values().map(Population::current_size).sum()
    }

    /// Sum of member species' weighted biomass/energy scores.
    pub fn total_score(&self) -> f64 {
        self.species
            .iter()
            .map(|(name, species)| {
                let size = self
                    .populations
                    .get(name)
                    .map(Population::current_size)
                    .unwrap_or(0.0);
                species.score(size)
            })
            .sum()
    }

    /// True when the level has no members or every member is at zero.
    pub fn is_collapsed(&self) -> bool {
        self.species.is_empty() || self.populations.values().all(Population::is_extinct)
    }

    pub(crate) fn insert(
        &mut self,
        mut species: Species,
        population: Population,
    ) -> Result<(), SimulationError> {
        if species.name() != population.species() {
            return Err(SimulationError::PopulationKeyMismatch {
                species: species.name().to_string(),
                population: population.species().to_string(),
            });
        }
        if self.species.contains_key(species.name()) {
            return Err(SimulationError::DuplicateSpecies(species.name().to_string()));
        }
        species.tag(self.rank);
        let key = species.name().to_string();
        self.populations.insert(key.clone(), population);
        self.species.insert(key, species);
        Ok(())
    }
}
