//! Float switch monitoring core.
//!
//! The [`Scheduler`] periodically ticks a [`LevelStateMachine`], which reads
//! the float switch through a [`SensorReader`], consults the
//! [`NotificationGate`] for the current hour and writes the leak state to an
//! [`AccessorySink`]. Everything in here is free of hardware and protocol
//! details; those live behind the two traits below.

pub mod clock;
pub mod level;
pub mod scheduler;
pub mod session;
pub mod state_machine;
pub mod window;

pub use clock::{Clock, SystemClock};
pub use level::{AlarmDeliveryState, WaterLevelState};
pub use scheduler::{DEFAULT_POLL_INTERVAL, MAX_POLL_INTERVAL, MIN_POLL_INTERVAL, Scheduler};
pub use session::MonitorSession;
pub use state_machine::{LevelStateMachine, TickResult};
pub use window::{NotificationGate, NotificationWindow};

use crate::error::Result;
use std::sync::Arc;

/// Source of the current water level.
///
/// Fails with [`MonitorError::SensorFault`](crate::error::MonitorError::SensorFault)
/// when the hardware cannot be read; the tick is then skipped.
pub trait SensorReader: Send {
    fn read(&mut self) -> Result<WaterLevelState>;
}

/// Destination for leak alarm updates (the hub-facing characteristic).
///
/// Writing the same value twice must be harmless. Fails with
/// [`MonitorError::SinkWriteFault`](crate::error::MonitorError::SinkWriteFault)
/// when the protocol cannot take the write.
pub trait AccessorySink: Send + Sync {
    fn set_alarm(&self, active: bool) -> Result<()>;
}

impl<T: AccessorySink + ?Sized> AccessorySink for Arc<T> {
    fn set_alarm(&self, active: bool) -> Result<()> {
        (**self).set_alarm(active)
    }
}
