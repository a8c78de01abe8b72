//! Simulated float switch.
//!
//! Lets the monitor run on hosts without GPIO. The reader and its
//! [`SimulationHandle`] share state, so a background task (or a test) can
//! change the water level or inject read faults while the scheduler owns the
//! reader.

use crate::error::{MonitorError, Result};
use crate::monitor::{SensorReader, WaterLevelState};
use log::info;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

#[derive(Default)]
struct SimulatedState {
    high: AtomicBool,
    faulty: AtomicBool,
}

/// Reader half of the simulated switch.
pub struct SimulatedFloatSwitch {
    state: Arc<SimulatedState>,
}

/// Control half of the simulated switch.
#[derive(Clone)]
pub struct SimulationHandle {
    state: Arc<SimulatedState>,
}

impl SimulatedFloatSwitch {
    /// Create a switch reading low water, plus its control handle.
    pub fn new() -> (Self, SimulationHandle) {
        let state = Arc::new(SimulatedState::default());
        (
            Self {
                state: state.clone(),
            },
            SimulationHandle { state },
        )
    }
}

impl SensorReader for SimulatedFloatSwitch {
    fn read(&mut self) -> Result<WaterLevelState> {
        if self.state.faulty.load(Ordering::SeqCst) {
            return Err(MonitorError::SensorFault("simulated read failure".into()));
        }
        Ok(WaterLevelState::from(self.state.high.load(Ordering::SeqCst)))
    }
}

impl SimulationHandle {
    pub fn set_level(&self, level: WaterLevelState) {
        self.state.high.store(level.is_high(), Ordering::SeqCst);
    }

    pub fn level(&self) -> WaterLevelState {
        WaterLevelState::from(self.state.high.load(Ordering::SeqCst))
    }

    /// Flip the level and return the new one.
    pub fn toggle(&self) -> WaterLevelState {
        let old = self.state.high.fetch_xor(true, Ordering::SeqCst);
        WaterLevelState::from(!old)
    }

    /// Make subsequent reads fail until cleared.
    pub fn set_fault(&self, faulty: bool) {
        self.state.faulty.store(faulty, Ordering::SeqCst);
    }
}

/// Spawn a task that flips the simulated water level every `period`.
///
/// # Returns
///
/// A `JoinHandle` that can be used to abort the simulation task.
pub fn run_level_simulation(handle: SimulationHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval(period);
        // First tick of a tokio interval completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let level = handle.toggle();
            info!("[Sim] Water level switched to: {}", level);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_level_is_low() {
        let (mut switch, handle) = SimulatedFloatSwitch::new();
        assert_eq!(switch.read().unwrap(), WaterLevelState::Low);
        assert_eq!(handle.level(), WaterLevelState::Low);
    }

    #[test]
    fn test_handle_controls_reader() {
        let (mut switch, handle) = SimulatedFloatSwitch::new();
        handle.set_level(WaterLevelState::High);
        assert_eq!(switch.read().unwrap(), WaterLevelState::High);

        assert_eq!(handle.toggle(), WaterLevelState::Low);
        assert_eq!(switch.read().unwrap(), WaterLevelState::Low);
    }

    #[test]
    fn test_fault_injection() {
        let (mut switch, handle) = SimulatedFloatSwitch::new();
        handle.set_fault(true);
        assert!(matches!(switch.read(), Err(MonitorError::SensorFault(_))));

        handle.set_fault(false);
        assert!(switch.read().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_toggles_each_period() {
        let (mut switch, handle) = SimulatedFloatSwitch::new();
        let task = run_level_simulation(handle, Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(switch.read().unwrap(), WaterLevelState::High);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(switch.read().unwrap(), WaterLevelState::Low);

        task.abort();
    }
}
