use anyhow::Result;
use tracing::{debug, warn};

use crate::{
    engine::{System, SystemContext},
    error::SimulationError,
    rng::SystemRng,
    season::{default_season_table, SeasonModifiers, SeasonTable},
    species::TrophicRank,
    world::World,
};

/// Drives producer growth and die-off from the calendar rather than from
/// predation.
#[derive(Debug)]
pub struct SeasonSystem {
    modifiers: SeasonTable,
}

impl SeasonSystem {
    pub fn new() -> Self {
        Self::with_modifiers(default_season_table())
    }

    pub fn with_modifiers(modifiers: SeasonTable) -> Self {
        Self { modifiers }
    }

    pub fn modifiers(&self) -> &SeasonTable {
        &self.modifiers
    }
}

impl Default for SeasonSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SeasonSystem {
    fn name(&self) -> &'static str {
        "season"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let modifiers = match self.modifiers.get(&ctx.season) {
            Some(modifiers) => *modifiers,
            None => {
                warn!(season = %ctx.season, "no producer modifiers for season, using neutral multipliers");
                SeasonModifiers::NEUTRAL
            }
        };

        let producers = world.level_mut(TrophicRank::Producer)?;
        let names = producers.species_names();
        if let Some(missing) = names.iter().find(|name| producers.population(name).is_none()) {
            return Err(SimulationError::MissingPopulation {
                level: producers.name().to_string(),
                species: missing.clone(),
            }
            .into());
        }

        for population in producers.populations_mut() {
            population.grow_by(modifiers.growth);
            population.shrink_by(modifiers.mortality);
            debug!(
                species = population.species(),
                size = population.current_size(),
                "seasonal producer update"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        population::Population,
        rng::RngManager,
        season::Season,
        species::Species,
    };

    fn world() -> World {
        let mut world = World::new(1).unwrap();
        for (rank, name) in [
            (TrophicRank::Producer, "Grass"),
            (TrophicRank::PrimaryConsumer, "Rabbit"),
        ] {
            world
                .register_species(
                    rank,
                    Species::new(name, 1.0, 1.0, rank),
                    Population::new(name, 100.0, 0.1, 0.05),
                )
                .unwrap();
        }
        world
    }

    fn run(system: &mut SeasonSystem, world: &mut World, season: Season) -> Result<()> {
        let mut rng = RngManager::new(0);
        let ctx = SystemContext {
            round: world.round(),
            season,
            scenario_name: "test",
        };
        system.run(&ctx, world, &mut rng.stream("season"))
    }

    #[test]
    fn spring_grows_producers_only() {
        let mut world = world();
        run(&mut SeasonSystem::new(), &mut world, Season::Spring).unwrap();
        // 100 + round(100 * 0.1 * 1.5) = 115, then 115 - round(115 * 0.05 * 0.5) = 112
        assert_eq!(world.population_size("Grass"), Some(112.0));
        assert_eq!(world.population_size("Rabbit"), Some(100.0));
    }

    #[test]
    fn winter_is_harsh() {
        let mut world = world();
        run(&mut SeasonSystem::new(), &mut world, Season::Winter).unwrap();
        // 100 + 3 = 103, then 103 - round(103 * 0.05 * 5) = 77
        assert_eq!(world.population_size("Grass"), Some(77.0));
    }

    #[test]
    fn missing_season_falls_back_to_neutral() {
        let mut world = world();
        let mut table = default_season_table();
        table.remove(&Season::Summer);
        let mut system = SeasonSystem::with_modifiers(table);
        run(&mut system, &mut world, Season::Summer).unwrap();
        // 110, then 110 - 6
        assert_eq!(world.population_size("Grass"), Some(104.0));
    }
}
