//! Fixed-period driver for the level state machine.

use super::clock::Clock;
use super::state_machine::{LevelStateMachine, TickResult};
use super::{AccessorySink, SensorReader};
use crate::error::{MonitorError, Result};
use log::{debug, info};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

/// Default time between float switch checks (one hour).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3600);

/// Shortest accepted time between checks.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Longest accepted time between checks (one week).
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Runs [`LevelStateMachine::tick`] once per period until cancelled.
///
/// The first tick fires one full period after [`run`](Self::run) starts.
/// Ticks run synchronously inside the loop, so at most one is ever in
/// flight and cancellation only takes effect between ticks.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    period: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Scheduler {
    /// Periods outside [`MIN_POLL_INTERVAL`]..=[`MAX_POLL_INTERVAL`] are clamped.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Drive `machine` until `shutdown` is cancelled. Returns the number of
    /// completed ticks.
    pub async fn run<R, S, C>(
        &self,
        machine: &mut LevelStateMachine<R, S>,
        clock: &C,
        shutdown: CancellationToken,
    ) -> u64
    where
        R: SensorReader,
        S: AccessorySink,
        C: Clock,
    {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Checking water level every {} seconds",
            self.period.as_secs()
        );

        let mut completed = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Scheduler stopped after {} checks", completed);
                    break;
                }
                _ = ticker.tick() => {
                    let result = machine.tick(clock.now());
                    completed += 1;
                    if result != TickResult::NoChange {
                        info!("Check #{}: {:?}", completed, result);
                    } else {
                        debug!("Check #{}: {:?}", completed, result);
                    }
                }
            }
        }

        completed
    }
}

/// Await a spawned scheduler run. A panicked or aborted task becomes
/// [`MonitorError::SchedulerFailed`].
pub async fn join<T>(task: JoinHandle<T>) -> Result<T> {
    task.await
        .map_err(|e| MonitorError::SchedulerFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_is_clamped() {
        assert_eq!(Scheduler::new(Duration::MAX).period(), MAX_POLL_INTERVAL);
        assert_eq!(Scheduler::new(Duration::ZERO).period(), MIN_POLL_INTERVAL);
        assert_eq!(
            Scheduler::new(Duration::from_secs(60)).period(),
            Duration::from_secs(60)
        );
    }

    #[tokio::test]
    async fn test_join_returns_task_output() {
        let task = tokio::spawn(async { 3u64 });
        assert_eq!(join(task).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_join_maps_panic_to_error() {
        let task = tokio::spawn(async {
            panic!("tick blew up");
        });
        let err = join::<()>(task).await.unwrap_err();
        assert!(matches!(err, MonitorError::SchedulerFailed(_)));
    }
}
