//! Leak sensor accessory state.
//!
//! Holds the "leak detected" characteristic exposed through the BooleanState
//! cluster and the fixed battery information exposed through PowerSource.
//! Supports live Matter subscription updates: when the leak value changes,
//! the notification is pushed instantly to subscribed hubs.

use super::{ClusterNotifier, NotifiableSensor, Sensor};
use crate::error::{MonitorError, Result};
use crate::monitor::AccessorySink;
use log::debug;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Battery charge state values of the PowerSource cluster.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum BatChargeState {
    Unknown = 0,
    IsCharging = 1,
    IsAtFullCharge = 2,
    IsNotCharging = 3,
}

/// Static battery fields. The sensor is mains powered, so these never change.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BatteryStatus {
    pub percent: u8,
    pub charge_state: BatChargeState,
    pub low_battery: bool,
}

impl BatteryStatus {
    pub const FIXED: Self = Self {
        percent: 100,
        charge_state: BatChargeState::IsCharging,
        low_battery: false,
    };

    /// `BatPercentRemaining` is reported in half-percent units.
    pub fn half_percent(&self) -> u8 {
        self.percent.saturating_mul(2)
    }
}

/// Shared leak sensor accessory.
///
/// Written by the monitor through [`AccessorySink`], read by the Matter
/// cluster handlers. Writes are rejected while the Matter stack is offline
/// so the monitor keeps the alarm pending and retries.
pub struct LeakAccessory {
    leak_detected: AtomicBool,
    version: AtomicU32,
    online: AtomicBool,
    battery: BatteryStatus,
    /// Set after Matter stack initialization via `set_notifier()`.
    notifier: RwLock<Option<ClusterNotifier>>,
}

impl Default for LeakAccessory {
    fn default() -> Self {
        Self::new()
    }
}

impl LeakAccessory {
    /// New accessory reporting no leak, offline until the stack starts.
    pub fn new() -> Self {
        Self {
            leak_detected: AtomicBool::new(false),
            version: AtomicU32::new(0),
            online: AtomicBool::new(false),
            battery: BatteryStatus::FIXED,
            notifier: RwLock::new(None),
        }
    }

    pub fn leak_detected(&self) -> bool {
        self.leak_detected.load(Ordering::SeqCst)
    }

    pub fn battery(&self) -> BatteryStatus {
        self.battery
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Called by the Matter stack when its transport starts or stops.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl AccessorySink for LeakAccessory {
    fn set_alarm(&self, active: bool) -> Result<()> {
        if !self.is_online() {
            return Err(MonitorError::SinkWriteFault(
                "Matter stack is not running".into(),
            ));
        }

        let old = self.leak_detected.swap(active, Ordering::SeqCst);
        if old != active {
            self.version.fetch_add(1, Ordering::SeqCst);
            if let Some(notifier) = self.notifier.read().as_ref() {
                notifier.notify();
            }
        }
        debug!("LeakDetected set to {}", u8::from(active));
        Ok(())
    }
}

impl NotifiableSensor for LeakAccessory {
    fn set_notifier(&self, notifier: ClusterNotifier) {
        *self.notifier.write() = Some(notifier);
    }
}

impl Sensor for LeakAccessory {
    fn version(&self) -> u32 {
        self.version.load(Ordering::SeqCst)
    }
}
