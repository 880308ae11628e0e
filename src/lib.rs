pub mod generator;
pub mod location;
pub mod publishers;
pub mod simulator;

pub use generator::{Clock, EventGenerator, RandomSource, RngSource, Roster, SystemClock};
pub use location::LocationEvent;
pub use publishers::{PublishError, Publisher};
pub use simulator::{RunSummary, Simulator, SimulatorConfig, SimulatorError};
