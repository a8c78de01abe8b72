//! Long-lived monitor state.

use super::level::{AlarmDeliveryState, WaterLevelState};
use super::window::NotificationWindow;

/// State carried between ticks for the lifetime of the process.
///
/// Starts as low water with nothing delivered and is never persisted, so a
/// restart always begins from that state again. Only
/// [`LevelStateMachine::tick`](super::LevelStateMachine::tick) mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSession {
    pub(super) last_observed_level: WaterLevelState,
    pub(super) last_delivered_alarm: AlarmDeliveryState,
    window: Option<NotificationWindow>,
}

impl MonitorSession {
    pub fn new(window: Option<NotificationWindow>) -> Self {
        Self {
            last_observed_level: WaterLevelState::Low,
            last_delivered_alarm: AlarmDeliveryState::NotDelivered,
            window,
        }
    }

    pub fn last_observed_level(&self) -> WaterLevelState {
        self.last_observed_level
    }

    pub fn last_delivered_alarm(&self) -> AlarmDeliveryState {
        self.last_delivered_alarm
    }

    pub fn window(&self) -> Option<&NotificationWindow> {
        self.window.as_ref()
    }

    /// High water is known but the hub has not been told yet.
    pub fn has_pending_alarm(&self) -> bool {
        self.last_observed_level.is_high()
            && self.last_delivered_alarm == AlarmDeliveryState::NotDelivered
    }
}
