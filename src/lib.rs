pub mod agent;
pub mod belief;
pub mod constants;
pub mod grid;
pub mod logging;
pub mod planner;
pub mod protocol;
pub mod rng;
pub mod search;
pub mod sim;
pub mod types;
