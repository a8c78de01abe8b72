//! Float switch on a GPIO input.

mod float_switch;

pub use float_switch::{DEFAULT_FLOAT_SWITCH_PIN, FloatSwitch};
