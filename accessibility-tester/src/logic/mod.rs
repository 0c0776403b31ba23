pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use simulation::{ActionMix, SessionSimulator, SimStep, SimulationPlan, SimulationSummary};
pub use tester::*;
