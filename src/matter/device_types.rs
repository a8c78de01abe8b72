//! Device type definitions for the leak sensor.
//!
//! Following the Matter specification device library.

use rs_matter::dm::DeviceType;

/// Matter Water Leak Detector device type (Matter 1.3 spec)
///
/// Device Type ID: 0x0043 (67 decimal)
/// Device Type Revision: 1
///
/// Required clusters:
/// - BooleanState (0x0045), StateValue = leak detected
/// - Descriptor (standard)
pub const DEV_TYPE_WATER_LEAK_DETECTOR: DeviceType = DeviceType {
    dtype: 0x0043,
    drev: 1,
};

/// Matter Power Source device type
///
/// Device Type ID: 0x0011 (17 decimal)
/// Device Type Revision: 1
///
/// Required clusters:
/// - PowerSource (0x002F)
///
/// Added to the leak detector endpoint so hubs show the battery fields.
pub const DEV_TYPE_POWER_SOURCE: DeviceType = DeviceType {
    dtype: 0x0011,
    drev: 1,
};
