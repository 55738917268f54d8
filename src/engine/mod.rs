use std::collections::BTreeSet;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    disaster::Disaster,
    error::SimulationError,
    population::Population,
    rng::{RngManager, SystemRng},
    season::Season,
    species::{Species, TrophicRank},
    systems::{
        DisasterEvent, DisasterSystem, FoodChainSystem, PlayerActionSystem, SeasonSystem,
    },
    world::World,
};

/// A species scheduled to join the world at the start of `round`.
#[derive(Debug, Clone)]
pub struct Introduction {
    pub round: u64,
    pub rank: TrophicRank,
    pub species: Species,
    pub population: Population,
}

#[derive(Debug)]
pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
}

/// Collects the four rule systems before the engine fixes their order.
pub struct EngineBuilder {
    settings: EngineSettings,
    season: SeasonSystem,
    player_action: PlayerActionSystem,
    food_chain: FoodChainSystem,
    disaster: DisasterSystem,
    introductions: Vec<Introduction>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            season: SeasonSystem::new(),
            player_action: PlayerActionSystem::new(),
            food_chain: FoodChainSystem::new(),
            disaster: DisasterSystem::new(),
            introductions: Vec::new(),
        }
    }

    pub fn with_season_system(mut self, system: SeasonSystem) -> Self {
        self.season = system;
        self
    }

    pub fn with_player_action_system(mut self, system: PlayerActionSystem) -> Self {
        self.player_action = system;
        self
    }

    pub fn with_food_chain_system(mut self, system: FoodChainSystem) -> Self {
        self.food_chain = system;
        self
    }

    pub fn with_disaster_system(mut self, system: DisasterSystem) -> Self {
        self.disaster = system;
        self
    }

    pub fn with_introductions(mut self, introductions: Vec<Introduction>) -> Self {
        self.introductions = introductions;
        self
    }

    pub fn build(mut self, world: World) -> Result<Engine, SimulationError> {
        world.validate()?;
        {
            let mut scheduled = BTreeSet::new();
            for entry in &self.introductions {
                let name = entry.species.name();
                if world.contains_species(name) || !scheduled.insert(name) {
                    return Err(SimulationError::DuplicateSpecies(name.to_string()));
                }
            }
        }
        self.introductions.sort_by_key(|entry| entry.round);
        Ok(Engine {
            rng: RngManager::new(self.settings.seed),
            // Food chain reads the producer totals the season pass just wrote,
            // and disaster generation sees the round's final populations.
            systems: [
                RuleSystem::Season(self.season),
                RuleSystem::PlayerAction(self.player_action),
                RuleSystem::FoodChain(self.food_chain),
                RuleSystem::Disaster(self.disaster),
            ],
            world,
            settings: self.settings,
            introductions: self.introductions,
        })
    }
}

pub struct SystemContext<'a> {
    pub round: u64,
    pub season: Season,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &'static str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}

/// The closed set of rule systems a round is made of.
#[derive(Debug)]
pub enum RuleSystem {
    Season(SeasonSystem),
    PlayerAction(PlayerActionSystem),
    FoodChain(FoodChainSystem),
    Disaster(DisasterSystem),
}

impl System for RuleSystem {
    fn name(&self) -> &'static str {
        match self {
            RuleSystem::Season(system) => system.name(),
            RuleSystem::PlayerAction(system) => system.name(),
            RuleSystem::FoodChain(system) => system.name(),
            RuleSystem::Disaster(system) => system.name(),
        }
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        match self {
            RuleSystem::Season(system) => system.run(ctx, world, rng),
            RuleSystem::PlayerAction(system) => system.run(ctx, world, rng),
            RuleSystem::FoodChain(system) => system.run(ctx, world, rng),
            RuleSystem::Disaster(system) => system.run(ctx, world, rng),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RoundSummary {
    pub round: u64,
    pub season: Season,
    pub health: f64,
    pub extinction: bool,
    pub total_population: f64,
    pub introduced: Vec<String>,
    pub disaster: Option<DisasterEvent>,
}

#[derive(Debug)]
pub struct Engine {
    rng: RngManager,
    systems: [RuleSystem; 4],
    world: World,
    settings: EngineSettings,
    introductions: Vec<Introduction>,
}

impl Engine {
    /// Plays one round: every system in order, then the round counter moves.
    ///
    /// Species scheduled for this round join before any system runs. A failing
    /// system leaves whatever earlier systems already changed.
    pub fn run_round(&mut self) -> Result<RoundSummary> {
        self.world.validate()?;
        let round = self.world.round();
        let introduced = self.introduce_due_species(round)?;
        let season = self.world.season();
        let ctx = SystemContext {
            round,
            season,
            scenario_name: &self.settings.scenario_name,
        };
        for system in &mut self.systems {
            let name = system.name();
            let mut rng_stream = self.rng.stream(name);
            system
                .run(&ctx, &mut self.world, &mut rng_stream)
                .with_context(|| format!("{name} system failed in round {round}"))?;
            debug!(round, system = name, "system applied");
        }
        self.world.advance_round();

        let report = self.world.health_report();
        let summary = RoundSummary {
            round,
            season,
            health: report.health,
            extinction: report.extinction,
            total_population: self.world.total_population(),
            introduced,
            disaster: self.disaster_system().and_then(|system| system.last_event().cloned()),
        };
        info!(
            scenario = %self.settings.scenario_name,
            round,
            season = %season,
            health = summary.health,
            total_population = summary.total_population,
            "round complete"
        );
        Ok(summary)
    }

    fn introduce_due_species(&mut self, round: u64) -> Result<Vec<String>, SimulationError> {
        let due = self
            .introductions
            .iter()
            .take_while(|entry| entry.round <= round)
            .count();
        let mut introduced = Vec::with_capacity(due);
        for entry in self.introductions.drain(..due) {
            let name = entry.species.name().to_string();
            let rank = entry.rank;
            self.world
                .register_species(rank, entry.species, entry.population)?;
            info!(round, species = %name, level = %rank, "species introduced");
            introduced.push(name);
        }
        Ok(introduced)
    }

    pub fn run(&mut self, rounds: u64) -> Result<()> {
        self.run_with_hook(rounds, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, rounds: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&RoundSummary),
    {
        for _ in 0..rounds {
            let summary = self.run_round()?;
            hook(&summary);
        }
        Ok(())
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct access for gameplay commands such as rate changes or adding
    /// species mid-session.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn into_world(self) -> World {
        self.world
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn round(&self) -> u64 {
        self.world.round()
    }

    pub fn season(&self) -> Season {
        self.world.season()
    }

    pub fn population_size(&self, species: &str) -> Option<f64> {
        self.world.population_size(species)
    }

    pub fn health(&self) -> f64 {
        self.world.health()
    }

    pub fn current_disaster(&self) -> Option<&Disaster> {
        self.world.current_disaster()
    }

    /// Introductions that have not happened yet, earliest first.
    pub fn pending_introductions(&self) -> &[Introduction] {
        &self.introductions
    }

    /// Boosts `species` during the next round.
    pub fn choose_species(&mut self, species: impl Into<String>) {
        if let Some(system) = self.player_action_system_mut() {
            system.choose(species);
        }
    }

    pub fn respond_to_disaster(&mut self, action_index: usize) -> Result<(), SimulationError> {
        self.world.choose_disaster_response(action_index).map(|_| ())
    }

    pub fn player_action_system(&self) -> Option<&PlayerActionSystem> {
        self.systems.iter().find_map(|system| match system {
            RuleSystem::PlayerAction(inner) => Some(inner),
            _ => None,
        })
    }

    fn player_action_system_mut(&mut self) -> Option<&mut PlayerActionSystem> {
        self.systems.iter_mut().find_map(|system| match system {
            RuleSystem::PlayerAction(inner) => Some(inner),
            _ => None,
        })
    }

    pub fn disaster_system(&self) -> Option<&DisasterSystem> {
        self.systems.iter().find_map(|system| match system {
            RuleSystem::Disaster(inner) => Some(inner),
            _ => None,
        })
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|system| system.name()).collect()
    }
}
