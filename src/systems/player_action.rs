use anyhow::Result;
use tracing::info;

use crate::{
    engine::{System, SystemContext},
    error::SimulationError,
    rng::SystemRng,
    world::World,
};

pub const DEFAULT_BOOST_MULTIPLIER: f64 = 2.0;

/// Applies the player's single per-round growth boost.
#[derive(Debug)]
pub struct PlayerActionSystem {
    chosen: Option<String>,
    boost_multiplier: f64,
}

impl PlayerActionSystem {
    pub fn new() -> Self {
        Self::with_boost(DEFAULT_BOOST_MULTIPLIER)
    }

    pub fn with_boost(boost_multiplier: f64) -> Self {
        Self {
            chosen: None,
            boost_multiplier,
        }
    }

    /// Replaces any earlier choice for this round.
    pub fn choose(&mut self, species: impl Into<String>) {
        let species = species.into();
        self.chosen = (!species.is_empty()).then_some(species);
    }

    pub fn chosen(&self) -> Option<&str> {
        self.chosen.as_deref()
    }

    pub fn boost_multiplier(&self) -> f64 {
        self.boost_multiplier
    }
}

impl Default for PlayerActionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PlayerActionSystem {
    fn name(&self) -> &'static str {
        "player_action"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        // The choice is spent whether or not it resolves.
        let Some(species) = self.chosen.take() else {
            return Ok(());
        };
        let population = world
            .population_mut(&species)
            .ok_or_else(|| SimulationError::UnknownSpecies(species.clone()))?;
        let before = population.current_size();
        population.grow_by(self.boost_multiplier);
        info!(
            round = ctx.round,
            species = %species,
            before,
            after = population.current_size(),
            "player boost applied"
        );
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
        species::{Species, TrophicRank},
    };

    fn world() -> World {
        let mut world = World::new(3).unwrap();
        world
            .register_species(
                TrophicRank::PrimaryConsumer,
                Species::new("Rabbit", 4.0, 0.5, TrophicRank::PrimaryConsumer),
                Population::new("Rabbit", 200.0, 0.08, 0.05),
            )
            .unwrap();
        world
    }

    fn run(system: &mut PlayerActionSystem, world: &mut World) -> Result<()> {
        let mut rng = RngManager::new(0);
        let ctx = SystemContext {
            round: 1,
            season: Season::Spring,
            scenario_name: "test",
        };
        system.run(&ctx, world, &mut rng.stream("player_action"))
    }

    #[test]
    fn boost_applies_once_then_clears() {
        let mut world = world();
        let mut system = PlayerActionSystem::new();
        system.choose("Rabbit");
        run(&mut system, &mut world).unwrap();
        // 200 + round(200 * 0.08 * 2) = 232
        assert_eq!(world.population_size("Rabbit"), Some(232.0));
        assert_eq!(system.chosen(), None);

        run(&mut system, &mut world).unwrap();
        assert_eq!(world.population_size("Rabbit"), Some(232.0));
    }

    #[test]
    fn unknown_species_is_fatal_and_still_clears() {
        let mut world = world();
        let mut system = PlayerActionSystem::new();
        system.choose("Unicorn");
        let err = run(&mut system, &mut world).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SimulationError>(),
            Some(&SimulationError::UnknownSpecies("Unicorn".into()))
        );
        assert_eq!(system.chosen(), None);
        assert_eq!(world.population_size("Rabbit"), Some(200.0));
    }

    #[test]
    fn empty_choice_is_a_no_op() {
        let mut world = world();
        let mut system = PlayerActionSystem::new();
        system.choose("");
        assert_eq!(system.chosen(), None);
        run(&mut system, &mut world).unwrap();
        assert_eq!(world.population_size("Rabbit"), Some(200.0));
    }
}
