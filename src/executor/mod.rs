//! Scenario execution engine
//!
//! Runs scenarios one after another, each on a fresh network.

mod runner;

pub use runner::ScenarioRunner;
