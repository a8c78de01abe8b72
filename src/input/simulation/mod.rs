//! Simulated water level input for development and testing.

mod sensors;

pub use sensors::{SimulatedFloatSwitch, SimulationHandle, run_level_simulation};
