//! Water level sources for the monitor.
//!
//! Current sources:
//! - `gpio`: float switch wired to a Raspberry Pi GPIO pin
//! - `simulation`: in-memory switch for development hosts without GPIO

pub mod gpio;
pub mod simulation;

pub use gpio::FloatSwitch;
pub use simulation::{SimulatedFloatSwitch, SimulationHandle};
