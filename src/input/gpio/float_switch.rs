//! Float switch read through `rppal`.
//!
//! With the default wiring the float closes the contact to ground when the
//! water rises: the pin gets the internal pull-up and a LOW level means high
//! water. Active-high switches get the pull-down instead. Either way a
//! disconnected switch reads as "no water".

use crate::error::{MonitorError, Result};
use crate::monitor::{SensorReader, WaterLevelState};
use log::info;
use rppal::gpio::{Bias, Gpio, InputPin, Level};

/// BCM pin used when none is configured.
pub const DEFAULT_FLOAT_SWITCH_PIN: u8 = 17;

/// Exclusive handle on the float switch pin.
///
/// The pin is returned to its original mode when this is dropped.
pub struct FloatSwitch {
    pin: InputPin,
    active_high: bool,
}

impl FloatSwitch {
    /// Claim `pin` (BCM numbering) as a biased input.
    ///
    /// `active_high` flips the polarity for switches that drive the pin high
    /// when the water rises.
    pub fn open(pin: u8, active_high: bool) -> Result<Self> {
        let gpio = Gpio::new()
            .map_err(|e| MonitorError::SensorFault(format!("GPIO unavailable: {}", e)))?;
        let pin = gpio
            .get(pin)
            .map_err(|e| MonitorError::SensorFault(format!("GPIO pin {}: {}", pin, e)))?;
        let bias = Self::bias(active_high);
        let pin = match bias {
            Bias::PullDown => pin.into_input_pulldown(),
            _ => pin.into_input_pullup(),
        };

        info!(
            "Water level sensor initialised on GPIO pin {} ({}, {:?})",
            pin.pin(),
            if active_high { "active high" } else { "active low" },
            bias
        );

        Ok(Self { pin, active_high })
    }

    pub fn pin(&self) -> u8 {
        self.pin.pin()
    }

    /// Bias that holds an unconnected pin at the "no water" level.
    pub fn bias(active_high: bool) -> Bias {
        if active_high {
            Bias::PullDown
        } else {
            Bias::PullUp
        }
    }

    /// Map a raw pin level to a water level for the given polarity.
    pub fn water_level(level: Level, active_high: bool) -> WaterLevelState {
        let asserted = match level {
            Level::High => active_high,
            Level::Low => !active_high,
        };
        WaterLevelState::from(asserted)
    }
}

impl SensorReader for FloatSwitch {
    fn read(&mut self) -> Result<WaterLevelState> {
        Ok(Self::water_level(self.pin.read(), self.active_high))
    }
}

impl Drop for FloatSwitch {
    fn drop(&mut self) {
        info!("GPIO cleanup done (pin {})", self.pin.pin());
    }
}
