use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    health::{deviation_to_score, ratio_deviation},
    rng::SystemRng,
    world::World,
};

/// How much harder predators are hit than prey when food runs short.
pub const DEFAULT_STARVATION_PRESSURE: f64 = 4.0;

/// Nudges every adjacent prey/predator pair of levels back toward its ideal
/// ratio. Pairs are handled bottom-up, each against the populations left by
/// the pair before it.
#[derive(Debug)]
pub struct FoodChainSystem {
    starvation_pressure: f64,
}

impl FoodChainSystem {
    pub fn new() -> Self {
        Self::with_starvation_pressure(DEFAULT_STARVATION_PRESSURE)
    }

    pub fn with_starvation_pressure(starvation_pressure: f64) -> Self {
        Self {
            starvation_pressure: starvation_pressure.max(0.0),
        }
    }
}

impl Default for FoodChainSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for FoodChainSystem {
    fn name(&self) -> &'static str {
        "food_chain"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let levels = world.levels_mut();
        for index in 1..levels.len() {
            let (lower, upper) = levels.split_at_mut(index);
            let prey = &mut lower[index - 1];
            let predator = &mut upper[0];

            let total_prey = prey.total_population();
            let total_predator = predator.total_population();
            if total_prey == 0.0 || total_predator == 0.0 {
                continue;
            }

            let deviation = ratio_deviation(
                total_prey,
                total_predator,
                prey.ideal_ratio(),
                predator.ideal_ratio(),
            );
            let balance = deviation_to_score(deviation);
            if balance >= 1.0 {
                continue;
            }

            let actual_ratio = total_prey / total_predator;
            let ideal_ratio = prey.ideal_ratio() / predator.ideal_ratio();
            if actual_ratio < ideal_ratio {
                // Overconsumption: predators starve and the scarce prey are
                // grazed down further.
                let shortage = 1.0 - balance;
                for population in predator.populations_mut() {
                    population.shrink_by(1.0 + self.starvation_pressure * shortage);
                }
                for population in prey.populations_mut() {
                    population.shrink_by(1.0 + shortage);
                }
            } else {
                for population in predator.populations_mut() {
                    population.grow_by(1.0 + deviation);
                }
                for population in prey.populations_mut() {
                    population.shrink_by(1.0 + deviation / 4.0);
                }
            }
            debug!(
                round = ctx.round,
                prey = prey.name(),
                predator = predator.name(),
                deviation,
                balance,
                prey_after = prey.total_population(),
                predator_after = predator.total_population(),
                "rebalanced trophic pair"
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
        species::{Species, TrophicRank},
    };

    fn world(groups: [&[(&str, f64)]; 4]) -> World {
        let mut world = World::new(3).unwrap();
        let ideals = [1000.0, 400.0, 150.0, 80.0];
        for (priority, members) in groups.iter().enumerate() {
            let rank = TrophicRank::from_priority(priority).unwrap();
            world.configure_level(rank, ideals[priority], None).unwrap();
            for (name, size) in members.iter() {
                world
                    .register_species(
                        rank,
                        Species::new(*name, 1.0, 1.0, rank),
                        Population::new(*name, *size, 0.1, 0.05),
                    )
                    .unwrap();
            }
        }
        world
    }

    fn apply(world: &mut World) {
        let mut rng = RngManager::new(0);
        let ctx = SystemContext {
            round: 1,
            season: Season::Spring,
            scenario_name: "test",
        };
        FoodChainSystem::new()
            .run(&ctx, world, &mut rng.stream("food_chain"))
            .unwrap();
    }

    fn sizes(world: &World) -> Vec<f64> {
        world
            .species_names()
            .iter()
            .filter_map(|name| world.population_size(name))
            .collect()
    }

    #[test]
    fn zero_totals_skip_the_pair() {
        let mut world = world([&[("A", 0.0)], &[("B", 0.0)], &[], &[]]);
        let before = sizes(&world);
        apply(&mut world);
        assert_eq!(sizes(&world), before);
    }

    #[test]
    fn scarce_prey_starves_predators_hard() {
        let mut world = world([&[("A", 10.0)], &[("B", 1000.0)], &[], &[]]);
        apply(&mut world);
        let predator = world.population_size("B").unwrap();
        assert!(predator < 1000.0 * 0.9, "predator only fell to {predator}");
        assert!(world.population_size("A").unwrap() < 10.0);
    }

    #[test]
    fn abundant_prey_feeds_a_predator_boom() {
        let mut world = world([&[("A", 5000.0)], &[("B", 100.0)], &[], &[]]);
        apply(&mut world);
        assert!(world.population_size("B").unwrap() > 110.0);
        assert!(world.population_size("A").unwrap() < 5000.0);
    }

    #[test]
    fn near_ideal_ratio_is_left_alone() {
        let mut world = world([&[("A", 1000.0)], &[("B", 380.0)], &[], &[]]);
        let before = sizes(&world);
        apply(&mut world);
        assert_eq!(sizes(&world), before);
    }

    #[test]
    fn middle_level_is_updated_once_per_pair() {
        // producers/primary are balanced, primary/secondary are not
        let mut world = world([&[("A", 1000.0)], &[("B", 400.0)], &[("C", 10.0)], &[]]);
        apply(&mut world);
        assert_eq!(world.population_size("A"), Some(1000.0));
        assert!(world.population_size("B").unwrap() < 400.0);
        assert!(world.population_size("C").unwrap() > 10.0);
    }

    #[test]
    fn middle_level_takes_both_pair_updates_in_order() {
        // A feeds a B boom, then the grown B is grazed down by too many C
        let mut world = world([&[("A", 1000.0)], &[("B", 200.0)], &[("C", 240.0)], &[]]);
        apply(&mut world);

        let mut expected = Population::new("B", 200.0, 0.1, 0.05);
        expected.grow_by(1.0 + ratio_deviation(1000.0, 200.0, 1000.0, 400.0));
        let after_lower = expected.current_size();
        assert_eq!(after_lower, 240.0);
        assert!(after_lower / 240.0 < 400.0 / 150.0);

        let upper = ratio_deviation(after_lower, 240.0, 400.0, 150.0);
        expected.shrink_by(1.0 + (1.0 - deviation_to_score(upper)));
        assert!(expected.current_size() < after_lower);
        assert_eq!(world.population_size("B"), Some(expected.current_size()));
        assert!(world.population_size("C").unwrap() < 240.0);
    }

    #[test]
    fn repeated_application_keeps_populations_non_negative() {
        let mut world = world([&[("A", 10.0)], &[("B", 500.0)], &[("C", 300.0)], &[("D", 200.0)]]);
        for _ in 0..10 {
            apply(&mut world);
        }
        assert!(sizes(&world).iter().all(|size| *size >= 0.0));
    }
}
