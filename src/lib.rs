pub mod disaster;
pub mod engine;
pub mod error;
pub mod health;
pub mod population;
pub mod rng;
pub mod scenario;
pub mod season;
pub mod species;
pub mod systems;
pub mod trophic;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, RoundSummary};
pub use error::SimulationError;
pub use scenario::{Scenario, ScenarioLoader};
pub use world::World;
