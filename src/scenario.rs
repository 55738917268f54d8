use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    disaster::DisasterCatalog,
    engine::{Engine, EngineBuilder, EngineSettings, Introduction},
    error::SimulationError,
    population::Population,
    season::{default_season_table, SeasonTable},
    species::{Species, TrophicRank},
    systems::{
        DisasterSystem, FoodChainSystem, PlayerActionSystem, SeasonSystem,
        DEFAULT_BOOST_MULTIPLIER, DEFAULT_DISASTER_PROBABILITY, DEFAULT_STARVATION_PRESSURE,
    },
    world::World,
};

fn default_rounds_per_season() -> u64 {
    3
}

fn default_mortality_rate() -> f64 {
    0.05
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_disaster_probability() -> f64 {
    DEFAULT_DISASTER_PROBABILITY
}

fn default_boost_multiplier() -> f64 {
    DEFAULT_BOOST_MULTIPLIER
}

fn default_starvation_pressure() -> f64 {
    DEFAULT_STARVATION_PRESSURE
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_rounds_per_season")]
    pub rounds_per_season: u64,
    #[serde(default)]
    pub rounds: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub disaster: DisasterConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub food_chain: FoodChainConfig,
    #[serde(default)]
    pub seasons: Option<SeasonTable>,
    #[serde(default)]
    pub levels: Vec<ScenarioLevel>,
    pub species: Vec<ScenarioSpecies>,
    #[serde(default)]
    pub disasters: Option<DisasterCatalog>,
    /// Species that join the world later in the session.
    #[serde(default)]
    pub introductions: Vec<ScenarioIntroduction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisasterConfig {
    #[serde(default = "default_disaster_probability")]
    pub probability: f64,
}

impl Default for DisasterConfig {
    fn default() -> Self {
        Self {
            probability: default_disaster_probability(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_boost_multiplier")]
    pub boost_multiplier: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            boost_multiplier: default_boost_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoodChainConfig {
    #[serde(default = "default_starvation_pressure")]
    pub starvation_pressure: f64,
}

impl Default for FoodChainConfig {
    fn default() -> Self {
        Self {
            starvation_pressure: default_starvation_pressure(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioLevel {
    pub level: TrophicRank,
    pub ideal_ratio: f64,
    /// Parsed for completeness; no system enforces it.
    #[serde(default)]
    pub cap: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioSpecies {
    pub name: String,
    pub level: TrophicRank,
    pub energy: f64,
    pub biomass: f64,
    pub population: f64,
    #[serde(default)]
    pub growth_rate: Option<f64>,
    #[serde(default = "default_mortality_rate")]
    pub mortality_rate: f64,
}

impl ScenarioSpecies {
    fn build(&self) -> (Species, Population) {
        let growth_rate = self
            .growth_rate
            .unwrap_or_else(|| self.level.default_growth_rate());
        (
            Species::new(&self.name, self.energy, self.biomass, self.level),
            Population::new(&self.name, self.population, growth_rate, self.mortality_rate),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioIntroduction {
    pub round: u64,
    pub species: ScenarioSpecies,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// Grass, Rabbit, Fox and Hawk on the four canonical levels.
    pub fn default_meadow() -> Self {
        let species = |name: &str, level, energy, biomass, population, growth_rate| ScenarioSpecies {
            name: name.to_string(),
            level,
            energy,
            biomass,
            population,
            growth_rate: Some(growth_rate),
            mortality_rate: default_mortality_rate(),
        };
        let tier = |level, ideal_ratio, cap| ScenarioLevel {
            level,
            ideal_ratio,
            cap,
        };
        Self {
            name: "meadow".to_string(),
            description: Some("Four-level grassland food chain".to_string()),
            seed: 7,
            rounds_per_season: default_rounds_per_season(),
            rounds: Some(12),
            logging: LoggingConfig::default(),
            disaster: DisasterConfig::default(),
            player: PlayerConfig::default(),
            food_chain: FoodChainConfig::default(),
            seasons: None,
            levels: vec![
                tier(TrophicRank::Producer, 1000.0, Some(100_000.0)),
                tier(TrophicRank::PrimaryConsumer, 400.0, None),
                tier(TrophicRank::SecondaryConsumer, 150.0, None),
                tier(TrophicRank::TertiaryConsumer, 80.0, None),
            ],
            species: vec![
                species("Grass", TrophicRank::Producer, 1.0, 0.05, 1000.0, 0.12),
                species("Rabbit", TrophicRank::PrimaryConsumer, 4.0, 0.5, 200.0, 0.08),
                species("Fox", TrophicRank::SecondaryConsumer, 20.0, 5.0, 20.0, 0.02),
                species("Hawk", TrophicRank::TertiaryConsumer, 45.0, 6.0, 5.0, 0.01),
            ],
            disasters: None,
            introductions: vec![
                ScenarioIntroduction {
                    round: 7,
                    species: species("Berry Bush", TrophicRank::Producer, 2.0, 0.08, 50.0, 0.1),
                },
                ScenarioIntroduction {
                    round: 13,
                    species: species("Deer", TrophicRank::PrimaryConsumer, 10.0, 0.3, 50.0, 0.05),
                },
            ],
        }
    }

    /// Rejects tuning values the systems cannot run with.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let probability = self.disaster.probability;
        if !(0.0..=1.0).contains(&probability) {
            return Err(SimulationError::InvalidConfig(format!(
                "disaster.probability must lie in [0, 1], got {probability}"
            )));
        }
        non_negative("player.boost_multiplier", self.player.boost_multiplier)?;
        non_negative("food_chain.starvation_pressure", self.food_chain.starvation_pressure)?;
        if let Some(seasons) = &self.seasons {
            for (season, modifiers) in seasons {
                non_negative(&format!("seasons.{season}.growth"), modifiers.growth)?;
                non_negative(&format!("seasons.{season}.mortality"), modifiers.mortality)?;
            }
        }
        let scheduled = self.introductions.iter().map(|entry| &entry.species);
        for entry in self.species.iter().chain(scheduled) {
            for (field, value) in [
                ("population", entry.population),
                ("energy", entry.energy),
                ("biomass", entry.biomass),
                ("mortality_rate", entry.mortality_rate),
                ("growth_rate", entry.growth_rate.unwrap_or(0.0)),
            ] {
                non_negative(&format!("{}.{field}", entry.name), value)?;
            }
        }
        Ok(())
    }

    pub fn build_world(&self) -> Result<World, SimulationError> {
        self.validate()?;
        let mut world = World::new(self.rounds_per_season)?;
        for level in &self.levels {
            world.configure_level(level.level, level.ideal_ratio, level.cap)?;
        }
        for entry in &self.species {
            let (species, population) = entry.build();
            world.register_species(entry.level, species, population)?;
        }
        world.validate()?;
        Ok(world)
    }

    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            scenario_name: self.name.clone(),
            seed: self.seed,
        }
    }

    pub fn introductions(&self) -> Vec<Introduction> {
        self.introductions
            .iter()
            .map(|entry| {
                let (species, population) = entry.species.build();
                Introduction {
                    round: entry.round,
                    rank: entry.species.level,
                    species,
                    population,
                }
            })
            .collect()
    }

    /// Systems configured from this scenario, not yet bound to a world.
    pub fn engine_builder(&self) -> EngineBuilder {
        let seasons = self.seasons.clone().unwrap_or_else(default_season_table);
        let catalog = self.disasters.clone().unwrap_or_else(DisasterCatalog::builtin);
        EngineBuilder::new(self.settings())
            .with_season_system(SeasonSystem::with_modifiers(seasons))
            .with_player_action_system(PlayerActionSystem::with_boost(self.player.boost_multiplier))
            .with_food_chain_system(FoodChainSystem::with_starvation_pressure(
                self.food_chain.starvation_pressure,
            ))
            .with_disaster_system(DisasterSystem::with_catalog(
                catalog,
                self.disaster.probability,
            ))
            .with_introductions(self.introductions())
    }

    pub fn build_engine(&self) -> Result<Engine> {
        let world = self
            .build_world()
            .with_context(|| format!("Invalid ecosystem in scenario '{}'", self.name))?;
        Ok(self.engine_builder().build(world)?)
    }

    pub fn rounds(&self, override_rounds: Option<u64>) -> u64 {
        override_rounds.or(self.rounds).unwrap_or(12)
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), SimulationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimulationError::InvalidConfig(format!(
            "{field} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}
