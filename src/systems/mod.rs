mod disaster;
mod food_chain;
mod player_action;
mod season;

pub use disaster::{apply_disaster_action, DisasterEvent, DisasterSystem, DEFAULT_DISASTER_PROBABILITY};
pub use food_chain::{FoodChainSystem, DEFAULT_STARVATION_PRESSURE};
pub use player_action::{PlayerActionSystem, DEFAULT_BOOST_MULTIPLIER};
pub use season::SeasonSystem;
