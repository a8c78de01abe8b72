//! Water level and alarm delivery states.

use std::fmt;

/// Physical reading of the float switch, sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WaterLevelState {
    /// Float is down, no water at the sensor. Also what an open circuit reads as.
    #[default]
    Low,
    /// Float is up, water reached the sensor.
    High,
}

impl WaterLevelState {
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for WaterLevelState {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

impl fmt::Display for WaterLevelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::High => f.write_str("high"),
        }
    }
}

/// Last value successfully pushed to the accessory for the current episode.
///
/// `Delivered` means the leak characteristic currently reads 1. `NotDelivered`
/// means it reads 0, or nothing has been pushed yet for a high water episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AlarmDeliveryState {
    #[default]
    NotDelivered,
    Delivered,
}

impl AlarmDeliveryState {
    /// Delivery state matching a successfully pushed characteristic value.
    pub fn after_push(active: bool) -> Self {
        if active {
            Self::Delivered
        } else {
            Self::NotDelivered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_process_start() {
        assert_eq!(WaterLevelState::default(), WaterLevelState::Low);
        assert_eq!(AlarmDeliveryState::default(), AlarmDeliveryState::NotDelivered);
    }

    #[test]
    fn test_from_bool() {
        assert_eq!(WaterLevelState::from(true), WaterLevelState::High);
        assert_eq!(WaterLevelState::from(false), WaterLevelState::Low);
        assert!(WaterLevelState::High.is_high());
        assert!(!WaterLevelState::Low.is_high());
    }

    #[test]
    fn test_after_push() {
        assert_eq!(AlarmDeliveryState::after_push(true), AlarmDeliveryState::Delivered);
        assert_eq!(
            AlarmDeliveryState::after_push(false),
            AlarmDeliveryState::NotDelivered
        );
    }
}
