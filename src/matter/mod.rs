//! Matter accessory exposing the water level as a leak sensor.

mod netif;
mod stack;

pub mod clusters;
pub mod device_types;
pub mod sensors;

pub use netif::detect_interface;
pub use sensors::{BatteryStatus, LeakAccessory};
pub use stack::{LEAK_ENDPOINT_ID, MatterTransport, run_matter_stack, stack_ready};
