//! Matter cluster handlers for the leak sensor endpoint.
//!
//! Note: We implement the Handler traits manually rather than using the
//! import! macro, keeping each cluster down to the attributes the leak sensor
//! actually serves.

use super::sensors::Sensor;
use rs_matter::dm::Dataver;
use std::sync::atomic::{AtomicU32, Ordering};

pub mod boolean_state;
pub mod power_source;

pub use boolean_state::BooleanStateHandler;
pub use power_source::PowerSourceHandler;

/// Bump `dataver` when the sensor's version moved past `last_version`.
///
/// Returns whether the dataver changed.
pub fn sync_dataver_with_sensor<S: Sensor + ?Sized>(
    sensor: &S,
    last_version: &AtomicU32,
    dataver: &Dataver,
) -> bool {
    let current = sensor.version();
    let last = last_version.swap(current, Ordering::SeqCst);
    if current != last {
        dataver.changed();
        true
    } else {
        false
    }
}
