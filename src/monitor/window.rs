//! Time-of-day gating for leak notifications.
//!
//! A [`NotificationWindow`] is a half-open hour range `[start, end)` in local
//! time. Windows wrapping past midnight are not supported: the start hour may
//! not be later than the end hour, and `start == end` is a valid but empty
//! window that never allows delivery.

use crate::error::{MonitorError, Result};
use std::fmt;

/// Highest valid hour of day.
pub const MAX_HOUR: u32 = 23;

/// Validated notification window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationWindow {
    start_hour: u32,
    end_hour: u32,
}

impl NotificationWindow {
    /// Build a window, rejecting hours above 23 and wrapping ranges.
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self> {
        if start_hour > MAX_HOUR || end_hour > MAX_HOUR || start_hour > end_hour {
            return Err(MonitorError::InvalidWindowConfig {
                start: start_hour,
                end: end_hour,
            });
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    /// Build a window from optional bounds. Absent bounds mean "always allowed".
    pub fn from_bounds(start_hour: Option<u32>, end_hour: Option<u32>) -> Result<Option<Self>> {
        match (start_hour, end_hour) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => Self::new(start, end).map(Some),
            _ => Err(MonitorError::IncompleteWindowConfig),
        }
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    pub fn is_empty(&self) -> bool {
        self.start_hour == self.end_hour
    }
}

impl fmt::Display for NotificationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

/// Pure delivery decision for a given hour.
pub struct NotificationGate;

impl NotificationGate {
    /// `start <= hour < end`.
    pub fn is_allowed(hour: u32, window: &NotificationWindow) -> bool {
        window.start_hour <= hour && hour < window.end_hour
    }

    /// Like [`is_allowed`](Self::is_allowed), but a missing window allows every hour.
    pub fn allows(hour: u32, window: Option<&NotificationWindow>) -> bool {
        window.is_none_or(|w| Self::is_allowed(hour, w))
    }
}
