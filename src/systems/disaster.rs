use anyhow::Result;
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    disaster::{DisasterAction, DisasterCatalog, DisasterState},
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

pub const DEFAULT_DISASTER_PROBABILITY: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisasterEvent {
    Published {
        round: u64,
        key: String,
        title: String,
    },
    Resolved {
        round: u64,
        title: String,
        action: Option<String>,
        target: Option<String>,
        applied: bool,
    },
}

/// Applies `action` to its target's population.
///
/// Returns `false`, leaving every population untouched, when the target is not
/// a registered species.
pub fn apply_disaster_action(world: &mut World, action: &DisasterAction) -> bool {
    if !world.contains_species(&action.target) {
        return false;
    }
    match world.population_mut(&action.target) {
        Some(population) => {
            population.adjust_by(action.delta_population);
            true
        }
        None => false,
    }
}

/// Publishes random disasters and resolves them one round later with whatever
/// response the player picked in between.
#[derive(Debug)]
pub struct DisasterSystem {
    probability: f64,
    catalog: DisasterCatalog,
    last_event: Option<DisasterEvent>,
    history: Vec<DisasterEvent>,
}

impl DisasterSystem {
    pub fn new() -> Self {
        Self::with_catalog(DisasterCatalog::builtin(), DEFAULT_DISASTER_PROBABILITY)
    }

    pub fn with_catalog(catalog: DisasterCatalog, probability: f64) -> Self {
        Self {
            // NaN would publish every idle round
            probability: if probability.is_nan() {
                0.0
            } else {
                probability.clamp(0.0, 1.0)
            },
            catalog,
            last_event: None,
            history: Vec::new(),
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn catalog(&self) -> &DisasterCatalog {
        &self.catalog
    }

    /// What happened during the most recent run, if anything.
    pub fn last_event(&self) -> Option<&DisasterEvent> {
        self.last_event.as_ref()
    }

    pub fn history(&self) -> &[DisasterEvent] {
        &self.history
    }

    fn record(&mut self, event: DisasterEvent) {
        self.history.push(event.clone());
        self.last_event = Some(event);
    }
}

impl Default for DisasterSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for DisasterSystem {
    fn name(&self) -> &'static str {
        "disaster"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        self.last_event = None;
        match std::mem::take(&mut world.disaster) {
            DisasterState::AwaitingResolution { disaster, response } => {
                let event = match response {
                    Some(action) => {
                        let applied = apply_disaster_action(world, &action);
                        if applied {
                            info!(
                                round = ctx.round,
                                disaster = %disaster.title,
                                action = %action.label,
                                target = %action.target,
                                delta = action.delta_population,
                                health = world.health(),
                                "disaster resolved"
                            );
                        } else {
                            warn!(
                                round = ctx.round,
                                disaster = %disaster.title,
                                target = %action.target,
                                "disaster response targets an unknown species, nothing applied"
                            );
                        }
                        DisasterEvent::Resolved {
                            round: ctx.round,
                            title: disaster.title,
                            action: Some(action.label),
                            target: Some(action.target),
                            applied,
                        }
                    }
                    None => {
                        info!(round = ctx.round, disaster = %disaster.title, "disaster passed without a response");
                        DisasterEvent::Resolved {
                            round: ctx.round,
                            title: disaster.title,
                            action: None,
                            target: None,
                            applied: false,
                        }
                    }
                };
                self.record(event);
            }
            DisasterState::Idle => {
                if self.catalog.is_empty() {
                    return Ok(());
                }
                let roll: f64 = rng.gen();
                if roll >= self.probability {
                    return Ok(());
                }
                let index = rng.gen_range(0..self.catalog.len());
                if let Some(disaster) = self.catalog.nth(index).cloned() {
                    info!(
                        round = ctx.round,
                        disaster = %disaster.title,
                        health = world.health(),
                        "disaster published"
                    );
                    self.record(DisasterEvent::Published {
                        round: ctx.round,
                        key: disaster.key.clone(),
                        title: disaster.title.clone(),
                    });
                    world.disaster = DisasterState::AwaitingResolution {
                        disaster,
                        response: None,
                    };
                }
            }
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

    fn world() -> World {
        let mut world = World::new(3).unwrap();
        for (rank, name, size) in [
            (TrophicRank::Producer, "Grass", 1000.0),
            (TrophicRank::PrimaryConsumer, "Rabbit", 200.0),
        ] {
            world
                .register_species(
                    rank,
                    Species::new(name, 1.0, 1.0, rank),
                    Population::new(name, size, 0.1, 0.05),
                )
                .unwrap();
        }
        world
    }

    fn run(system: &mut DisasterSystem, world: &mut World, rng: &mut RngManager) {
        let ctx = SystemContext {
            round: world.round(),
            season: Season::Spring,
            scenario_name: "test",
        };
        system.run(&ctx, world, &mut rng.stream("disaster")).unwrap();
    }

    #[test]
    fn certain_roll_publishes_then_clears_without_response() {
        let mut world = world();
        let mut rng = RngManager::new(11);
        let mut system = DisasterSystem::with_catalog(DisasterCatalog::builtin(), 1.0);

        run(&mut system, &mut world, &mut rng);
        assert!(world.current_disaster().is_some());
        assert!(matches!(system.last_event(), Some(DisasterEvent::Published { .. })));
        let before = (world.population_size("Grass"), world.population_size("Rabbit"));

        run(&mut system, &mut world, &mut rng);
        assert!(world.current_disaster().is_none());
        assert_eq!(
            (world.population_size("Grass"), world.population_size("Rabbit")),
            before
        );
        assert!(matches!(
            system.last_event(),
            Some(DisasterEvent::Resolved { applied: false, action: None, .. })
        ));
        assert_eq!(system.history().len(), 2);
    }

    #[test]
    fn zero_probability_never_publishes() {
        let mut world = world();
        let mut rng = RngManager::new(11);
        let mut system = DisasterSystem::with_catalog(DisasterCatalog::builtin(), 0.0);
        for _ in 0..20 {
            run(&mut system, &mut world, &mut rng);
        }
        assert!(world.disaster_state().is_idle());
        assert!(system.history().is_empty());
    }

    #[test]
    fn nan_probability_never_publishes() {
        let mut world = world();
        let mut rng = RngManager::new(11);
        let mut system = DisasterSystem::with_catalog(DisasterCatalog::builtin(), f64::NAN);
        assert_eq!(system.probability(), 0.0);
        for _ in 0..5 {
            run(&mut system, &mut world, &mut rng);
        }
        assert!(system.history().is_empty());
    }

    #[test]
    fn chosen_response_is_applied_on_next_run() {
        let mut world = world();
        let mut rng = RngManager::new(3);
        let mut catalog = DisasterCatalog::empty();
        catalog.insert(
            "flood",
            DisasterCatalog::builtin().get("flood").cloned().unwrap(),
        );
        let mut system = DisasterSystem::with_catalog(catalog, 1.0);

        run(&mut system, &mut world, &mut rng);
        world.choose_disaster_response(0).unwrap();
        run(&mut system, &mut world, &mut rng);

        assert_eq!(world.population_size("Rabbit"), Some(245.0));
        assert!(world.disaster_state().is_idle());
        assert!(matches!(
            system.last_event(),
            Some(DisasterEvent::Resolved { applied: true, .. })
        ));
    }

    #[test]
    fn resolution_clamps_at_zero() {
        let mut world = world();
        world.set_population_size("Grass", 1000.0).unwrap();
        let applied = apply_disaster_action(
            &mut world,
            &DisasterAction::new("Scorch", "Grass", -2000.0),
        );
        assert!(applied);
        assert_eq!(world.population_size("Grass"), Some(0.0));
    }

    #[test]
    fn unknown_target_reports_not_applied() {
        let mut world = world();
        let applied = apply_disaster_action(
            &mut world,
            &DisasterAction::new("Protect Nesting Zones", "Hawk", 10.0),
        );
        assert!(!applied);
        assert_eq!(world.population_size("Grass"), Some(1000.0));
        assert_eq!(world.population_size("Rabbit"), Some(200.0));
    }

    #[test]
    fn empty_catalog_stays_idle() {
        let mut world = world();
        let mut rng = RngManager::new(1);
        let mut system = DisasterSystem::with_catalog(DisasterCatalog::empty(), 1.0);
        run(&mut system, &mut world, &mut rng);
        assert!(world.disaster_state().is_idle());
    }
}
