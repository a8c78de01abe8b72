//! Edge-triggered leak reporting with deferred delivery.
//!
//! Each tick combines one float switch reading with the notification gate:
//!
//! ```text
//!               High, allowed ──► push 1 ──► AlarmRaised
//!   Low ──────┤
//!               High, blocked ──► (none) ──► AlarmDeferred ──┐
//!                                                            │ later tick, allowed
//!                                                            ▼
//!                                       push 1 ──► DeferredAlarmDelivered
//!
//!   High ─────► Low (any hour) ──► push 0 ──► AlarmCleared
//! ```
//!
//! Clearing is never gated: a return to safe water level is always pushed.
//! The session only records a delivery after the sink accepted the write, so
//! a rejected write is retried on a later tick.

use super::level::{AlarmDeliveryState, WaterLevelState};
use super::session::MonitorSession;
use super::window::{NotificationGate, NotificationWindow};
use super::{AccessorySink, SensorReader};
use chrono::{NaiveDateTime, Timelike};
use log::{debug, error, info, warn};

/// Outcome of a single [`LevelStateMachine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    /// The sensor could not be read; the session is unchanged.
    Skipped,
    /// Nothing to report.
    NoChange,
    /// Water went high inside the window and the alarm was pushed.
    AlarmRaised,
    /// Water went high outside the window; delivery is held back.
    AlarmDeferred,
    /// Water went low (or a failed clear was retried) and 0 was pushed.
    AlarmCleared,
    /// A held-back alarm was pushed once the window opened.
    DeferredAlarmDelivered,
    /// The sink rejected the write of `value`; it will be retried.
    DeliveryFailed { value: bool },
}

/// Drives a [`MonitorSession`] from a sensor into an accessory sink.
pub struct LevelStateMachine<R, S> {
    session: MonitorSession,
    reader: R,
    sink: S,
}

impl<R: SensorReader, S: AccessorySink> LevelStateMachine<R, S> {
    pub fn new(reader: R, sink: S, window: Option<NotificationWindow>) -> Self {
        Self {
            session: MonitorSession::new(window),
            reader,
            sink,
        }
    }

    pub fn session(&self) -> &MonitorSession {
        &self.session
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Release the collaborators, e.g. to close the GPIO pin explicitly.
    pub fn into_parts(self) -> (R, S) {
        (self.reader, self.sink)
    }

    /// Sample the sensor once and push whatever the hub needs to know.
    pub fn tick(&mut self, now: NaiveDateTime) -> TickResult {
        let level = match self.reader.read() {
            Ok(level) => level,
            Err(e) => {
                error!("Skipping tick: {}", e);
                return TickResult::Skipped;
            }
        };

        let allowed = NotificationGate::allows(now.hour(), self.session.window());

        if level != self.session.last_observed_level {
            self.session.last_observed_level = level;

            return match level {
                WaterLevelState::High => {
                    warn!("High water level detected! Empty the barrel!");
                    if allowed {
                        self.push(true, TickResult::AlarmRaised)
                    } else {
                        if let Some(window) = self.session.window() {
                            info!("Notification deferred - outside allowed time ({})", window);
                        }
                        TickResult::AlarmDeferred
                    }
                }
                WaterLevelState::Low => {
                    info!("Water level OK");
                    self.push(false, TickResult::AlarmCleared)
                }
            };
        }

        match (level, self.session.last_delivered_alarm) {
            (WaterLevelState::High, AlarmDeliveryState::NotDelivered) if allowed => {
                info!("Sending deferred high water notification");
                self.push(true, TickResult::DeferredAlarmDelivered)
            }
            (WaterLevelState::Low, AlarmDeliveryState::Delivered) => {
                info!("Retrying leak clear after failed write");
                self.push(false, TickResult::AlarmCleared)
            }
            _ => {
                debug!("Water level unchanged ({})", level);
                TickResult::NoChange
            }
        }
    }

    /// Write to the sink and commit the delivery state only on success.
    fn push(&mut self, active: bool, on_success: TickResult) -> TickResult {
        match self.sink.set_alarm(active) {
            Ok(()) => {
                self.session.last_delivered_alarm = AlarmDeliveryState::after_push(active);
                on_success
            }
            Err(e) => {
                error!("{} (will retry next tick)", e);
                TickResult::DeliveryFailed { value: active }
            }
        }
    }
}
