use crate::error::{MonitorError, Result};
use crate::input::gpio::DEFAULT_FLOAT_SWITCH_PIN;
use crate::monitor::{
    DEFAULT_POLL_INTERVAL, MAX_POLL_INTERVAL, MIN_POLL_INTERVAL, NotificationWindow,
};
use clap::Parser;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default UDP port the accessory listens on for pairing and control.
pub const DEFAULT_PAIRING_PORT: u16 = 51826;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    let Ok(content) = fs::read_to_string(env_path) else {
        return;
    };

    for (key, value) in parse_dotenv(&content) {
        // Only set if not already set (env vars take precedence)
        if std::env::var(key).is_err() {
            // SAFETY: We're single-threaded at this point (called before any async runtime)
            unsafe { std::env::set_var(key, value) };
        }
    }
}

/// Split `.env` content into key/value pairs, skipping blanks and comments.
fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let mut value = value.trim();

            // Remove surrounding quotes if present
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }

            pairs.push((key.trim(), value));
        }
    }

    pairs
}

/// Command line options. Every option can also be given as an environment
/// variable (or in `.env`).
#[derive(Debug, Clone, Parser)]
#[command(name = "water-level-monitor")]
#[command(about = "Float switch water level monitor exposed as a Matter leak sensor")]
pub struct Cli {
    /// GPIO pin of the float switch (BCM numbering)
    #[arg(long, env = "FLOAT_SWITCH_PIN", default_value_t = DEFAULT_FLOAT_SWITCH_PIN)]
    pub pin: u8,

    /// The switch drives the pin high on high water (default: pulls it low)
    #[arg(long, env = "FLOAT_SWITCH_ACTIVE_HIGH")]
    pub active_high: bool,

    /// Seconds between water level checks (1 to 604800)
    #[arg(long, env = "CHECK_INTERVAL", default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub interval: u64,

    /// First hour (0-23) at which leak notifications are delivered
    #[arg(long = "notify-start", env = "NOTIFICATION_START_HOUR")]
    pub notify_start: Option<u32>,

    /// Hour (0-23) from which leak notifications are held back again
    #[arg(long = "notify-end", env = "NOTIFICATION_END_HOUR")]
    pub notify_end: Option<u32>,

    /// UDP port for the accessory protocol
    #[arg(long, env = "PAIRING_PORT", default_value_t = DEFAULT_PAIRING_PORT)]
    pub port: u16,

    /// Network interface to advertise on (auto-detected if omitted)
    #[arg(long, env = "NETWORK_INTERFACE")]
    pub interface: Option<String>,

    /// Use a simulated float switch instead of GPIO
    #[arg(long, env = "SIMULATE_SENSOR")]
    pub simulate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub sensor: SensorConfig,
    pub monitor: MonitorConfig,
    pub accessory: AccessoryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    pub pin: u8,
    pub active_high: bool,
    pub simulate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    /// Absent means notifications are delivered at any hour
    pub window: Option<NotificationWindow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryConfig {
    pub port: u16,
    pub interface: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensor: SensorConfig {
                pin: DEFAULT_FLOAT_SWITCH_PIN,
                active_high: false,
                simulate: false,
            },
            monitor: MonitorConfig {
                poll_interval: DEFAULT_POLL_INTERVAL,
                window: None,
            },
            accessory: AccessoryConfig {
                port: DEFAULT_PAIRING_PORT,
                interface: None,
            },
        }
    }
}

impl Config {
    /// Validate command line options into a configuration.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let poll_interval = Duration::from_secs(cli.interval);
        if !(MIN_POLL_INTERVAL..=MAX_POLL_INTERVAL).contains(&poll_interval) {
            return Err(MonitorError::InvalidInterval(cli.interval));
        }
        let window = NotificationWindow::from_bounds(cli.notify_start, cli.notify_end)?;

        Ok(Self {
            sensor: SensorConfig {
                pin: cli.pin,
                active_high: cli.active_high,
                simulate: cli.simulate,
            },
            monitor: MonitorConfig {
                poll_interval,
                window,
            },
            accessory: AccessoryConfig {
                port: cli.port,
                interface: cli.interface,
            },
        })
    }
}
