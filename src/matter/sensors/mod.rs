//! Accessory state shared between the monitor and Matter clusters.
//!
//! The monitor writes the leak characteristic through
//! [`AccessorySink`](crate::monitor::AccessorySink); cluster handlers read it
//! and use the [`Sensor`] version to detect changes for subscriptions.

pub mod helpers;
pub mod leak_sensor;

pub use helpers::notifier::ClusterNotifier;
pub use leak_sensor::{BatteryStatus, LeakAccessory};

/// Trait for sensors with change detection.
///
/// The version number should be incremented atomically each time the sensor
/// value changes. Handlers compare versions to detect changes and update
/// their `Dataver` to notify subscribers.
pub trait Sensor: Send + Sync {
    /// Get the current version number.
    fn version(&self) -> u32;
}

/// Trait for sensors that support live Matter subscription updates.
pub trait NotifiableSensor: Sensor {
    /// Set the notifier for this sensor.
    ///
    /// Called during Matter stack setup to wire the sensor to the
    /// subscription notification system.
    fn set_notifier(&self, notifier: ClusterNotifier);
}
