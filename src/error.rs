use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum MonitorError {
    #[error("Float switch read failed: {0}")]
    SensorFault(String),

    #[error("Failed to write leak state to accessory: {0}")]
    SinkWriteFault(String),

    #[error("Invalid notification window {start}:00-{end}:00 (hours must be 0-23 with start <= end)")]
    InvalidWindowConfig { start: u32, end: u32 },

    #[error("Notification window needs both a start and an end hour")]
    IncompleteWindowConfig,

    #[error("Invalid check interval {0}s (must be 1-604800 seconds)")]
    InvalidInterval(u64),

    #[error("Accessory transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("Another instance is already running")]
    AlreadyRunning,

    #[error("Scheduler stopped unexpectedly: {0}")]
    SchedulerFailed(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
