pub mod burglary;
pub mod factory;
pub mod grass_wetness;

pub use factory::{scenario_by_name, SCENARIO_NAMES};
