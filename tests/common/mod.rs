//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use water_level_monitor::error::{MonitorError, Result};
use water_level_monitor::monitor::{AccessorySink, SensorReader, WaterLevelState};

/// Reader that replays a fixed list of outcomes, then keeps returning the last one.
pub struct ScriptedReader {
    script: VecDeque<Option<WaterLevelState>>,
    last: Option<WaterLevelState>,
}

impl ScriptedReader {
    /// `None` entries produce a sensor fault.
    pub fn new(script: impl IntoIterator<Item = Option<WaterLevelState>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: None,
        }
    }

    pub fn levels(levels: &[WaterLevelState]) -> Self {
        Self::new(levels.iter().copied().map(Some))
    }
}

impl SensorReader for ScriptedReader {
    fn read(&mut self) -> Result<WaterLevelState> {
        let next = match self.script.pop_front() {
            Some(next) => next,
            None => self.last,
        };
        self.last = next;
        next.ok_or_else(|| MonitorError::SensorFault("scripted fault".into()))
    }
}

/// Sink that records every accepted write and can be switched offline.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pushes: Arc<Mutex<Vec<bool>>>,
    offline: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn pushes(&self) -> Vec<bool> {
        self.pushes.lock().clone()
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock() = offline;
    }
}

impl AccessorySink for RecordingSink {
    fn set_alarm(&self, active: bool) -> Result<()> {
        if *self.offline.lock() {
            return Err(MonitorError::SinkWriteFault("transport down".into()));
        }
        self.pushes.lock().push(active);
        Ok(())
    }
}

pub fn at_hour(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .expect("valid test time")
}
