//! Water level monitor library.
//!
//! Polls a float switch on a fixed interval and reports high water as a
//! leak on a Matter accessory, optionally holding notifications back outside
//! a configured time-of-day window until it opens.

pub mod config;
pub mod error;
pub mod input;
pub mod instance_lock;
pub mod matter;
pub mod monitor;

/// Accessory name shown in logs.
pub const ACCESSORY_NAME: &str = "Water Level Monitor";
