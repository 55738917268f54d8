use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    disaster::{Disaster, DisasterAction, DisasterState},
    error::SimulationError,
    health::{self, HealthReport},
    population::Population,
    season::Season,
    species::{Species, TrophicRank},
    trophic::TrophicLevel,
};

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesSnapshot {
    pub name: String,
    pub level: TrophicRank,
    pub population: f64,
    pub growth_rate: f64,
    pub mortality_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub round: u64,
    pub season: Season,
    pub health: f64,
    pub total_population: f64,
    pub pending_disaster: Option<String>,
    pub species: Vec<SpeciesSnapshot>,
}

/// Mutable state of one session.
///
/// Owns every trophic level (and through them every species and population).
/// `registry` maps species names to the level that holds them; it is written
/// only by [`World::register_species`].
#[derive(Debug, Clone)]
pub struct World {
    round: u64,
    rounds_per_season: u64,
    levels: Vec<TrophicLevel>,
    registry: BTreeMap<String, TrophicRank>,
    pub(crate) disaster: DisasterState,
}

impl World {
    /// Creates the four canonical levels, each with an ideal ratio of 1.
    pub fn new(rounds_per_season: u64) -> Result<Self, SimulationError> {
        if rounds_per_season == 0 {
            return Err(SimulationError::InvalidConfig(
                "rounds_per_season must be at least 1".into(),
            ));
        }
        let levels = TrophicRank::ALL
            .iter()
            .map(|rank| TrophicLevel::new(*rank, 1.0))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            round: 1,
            rounds_per_season,
            levels,
            registry: BTreeMap::new(),
            disaster: DisasterState::Idle,
        })
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn rounds_per_season(&self) -> u64 {
        self.rounds_per_season
    }

    pub fn season(&self) -> Season {
        Season::from_round(self.round, self.rounds_per_season)
    }

    pub(crate) fn advance_round(&mut self) {
        self.round += 1;
    }

    pub fn configure_level(
        &mut self,
        rank: TrophicRank,
        ideal_ratio: f64,
        cap: Option<f64>,
    ) -> Result<(), SimulationError> {
        let level = self.level_mut(rank)?;
        level.set_ideal_ratio(ideal_ratio)?;
        level.set_cap(cap);
        Ok(())
    }

    /// Adds a species and its population to `rank` in one step.
    pub fn register_species(
        &mut self,
        rank: TrophicRank,
        species: Species,
        population: Population,
    ) -> Result<(), SimulationError> {
        if self.registry.contains_key(species.name()) {
            return Err(SimulationError::DuplicateSpecies(species.name().to_string()));
        }
        check_rate(species.name(), "growth", population.base_growth_rate)?;
        check_rate(species.name(), "mortality", population.base_mortality_rate)?;
        let name = species.name().to_string();
        self.level_mut(rank)?.insert(species, population)?;
        self.registry.insert(name, rank);
        Ok(())
    }

    /// Checks that species and population registries describe the same set.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let species: usize = self.levels.iter().map(TrophicLevel::species_count).sum();
        let populations: usize = self.levels.iter().map(TrophicLevel::population_count).sum();
        if species != populations || species != self.registry.len() {
            return Err(SimulationError::RegistryMismatch {
                registered: self.registry.len(),
                species,
                populations,
            });
        }
        for level in &self.levels {
            for name in level.species_names() {
                if level.population(&name).is_none() {
                    return Err(SimulationError::MissingPopulation {
                        level: level.name().to_string(),
                        species: name,
                    });
                }
            }
        }
        Ok(())
    }

    /// Levels in ecological order, producers first.
    pub fn levels(&self) -> &[TrophicLevel] {
        &self.levels
    }

    pub(crate) fn levels_mut(&mut self) -> &mut [TrophicLevel] {
        &mut self.levels
    }

    pub fn level(&self, rank: TrophicRank) -> Result<&TrophicLevel, SimulationError> {
        self.levels
            .iter()
            .find(|level| level.rank() == rank)
            .ok_or(SimulationError::UnknownLevel(rank))
    }

    pub(crate) fn level_mut(&mut self, rank: TrophicRank) -> Result<&mut TrophicLevel, SimulationError> {
        self.levels
            .iter_mut()
            .find(|level| level.rank() == rank)
            .ok_or(SimulationError::UnknownLevel(rank))
    }

    pub fn species_count(&self) -> usize {
        self.registry.len()
    }

    pub fn species_names(&self) -> Vec<String> {
        self.registry.keys().cloned().collect()
    }

    pub fn contains_species(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    pub fn species(&self, name: &str) -> Option<&Species> {
        let rank = self.registry.get(name)?;
        self.level(*rank).ok()?.species_by_name(name)
    }

    pub fn population(&self, name: &str) -> Option<&Population> {
        let rank = self.registry.get(name)?;
        self.level(*rank).ok()?.population(name)
    }

    pub(crate) fn population_mut(&mut self, name: &str) -> Option<&mut Population> {
        let rank = *self.registry.get(name)?;
        self.level_mut(rank).ok()?.population_mut(name)
    }

    pub fn population_size(&self, name: &str) -> Option<f64> {
        self.population(name).map(Population::current_size)
    }

    pub fn total_population(&self) -> f64 {
        self.levels.iter().map(TrophicLevel::total_population).sum()
    }

    pub fn set_population_size(&mut self, name: &str, size: f64) -> Result<(), SimulationError> {
        self.population_mut(name)
            .ok_or_else(|| SimulationError::UnknownSpecies(name.to_string()))?
            .set_size(size);
        Ok(())
    }

    pub fn set_growth_rate(&mut self, name: &str, rate: f64) -> Result<(), SimulationError> {
        let population = self
            .population_mut(name)
            .ok_or_else(|| SimulationError::UnknownSpecies(name.to_string()))?;
        check_rate(name, "growth", rate)?;
        population.base_growth_rate = rate;
        Ok(())
    }

    pub fn set_mortality_rate(&mut self, name: &str, rate: f64) -> Result<(), SimulationError> {
        let population = self
            .population_mut(name)
            .ok_or_else(|| SimulationError::UnknownSpecies(name.to_string()))?;
        check_rate(name, "mortality", rate)?;
        population.base_mortality_rate = rate;
        Ok(())
    }

    pub fn health(&self) -> f64 {
        health::ecosystem_health(&self.levels)
    }

    pub fn health_report(&self) -> HealthReport {
        health::assess(&self.levels)
    }

    pub fn disaster_state(&self) -> &DisasterState {
        &self.disaster
    }

    pub fn current_disaster(&self) -> Option<&Disaster> {
        self.disaster.disaster()
    }

    /// Picks response `index` of the disaster awaiting resolution. It takes
    /// effect the next time the disaster system runs.
    pub fn choose_disaster_response(
        &mut self,
        index: usize,
    ) -> Result<&DisasterAction, SimulationError> {
        match &mut self.disaster {
            DisasterState::Idle => Err(SimulationError::NoPendingDisaster),
            DisasterState::AwaitingResolution { disaster, response } => {
                let action = disaster.actions.get(index).cloned().ok_or_else(|| {
                    SimulationError::UnknownAction {
                        disaster: disaster.title.clone(),
                        index,
                    }
                })?;
                Ok(&*response.insert(action))
            }
        }
    }

    /// Sets an arbitrary response for the disaster awaiting resolution.
    pub fn set_disaster_response(&mut self, action: DisasterAction) -> Result<(), SimulationError> {
        match &mut self.disaster {
            DisasterState::Idle => Err(SimulationError::NoPendingDisaster),
            DisasterState::AwaitingResolution { response, .. } => {
                *response = Some(action);
                Ok(())
            }
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let species = self
            .levels
            .iter()
            .flat_map(|level| {
                level.populations().map(move |pop| SpeciesSnapshot {
                    name: pop.species().to_string(),
                    level: level.rank(),
                    population: pop.current_size(),
                    growth_rate: pop.base_growth_rate,
                    mortality_rate: pop.base_mortality_rate,
                })
            })
            .collect();
        WorldSnapshot {
            round: self.round,
            season: self.season(),
            health: self.health(),
            total_population: self.total_population(),
            pending_disaster: self.current_disaster().map(|d| d.title.clone()),
            species,
        }
    }
}

fn check_rate(species: &str, label: &str, rate: f64) -> Result<(), SimulationError> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(SimulationError::InvalidConfig(format!(
            "{species} {label} rate must be a non-negative number, got {rate}"
        )));
    }
    Ok(())
}
