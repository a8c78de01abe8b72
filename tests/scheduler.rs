mod common;

use chrono::NaiveDateTime;
use common::{RecordingSink, ScriptedReader, at_hour};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use water_level_monitor::monitor::{LevelStateMachine, Scheduler, WaterLevelState};

const PERIOD: Duration = Duration::from_secs(3600);

fn noon() -> NaiveDateTime {
    at_hour(12)
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_after_one_full_period() {
    let sink = RecordingSink::default();
    let mut machine = LevelStateMachine::new(
        ScriptedReader::levels(&[WaterLevelState::High]),
        sink.clone(),
        None,
    );
    let shutdown = CancellationToken::new();
    let scheduler = Scheduler::new(PERIOD);

    let stopper = shutdown.clone();
    let observer = sink.clone();
    let stop_task = tokio::spawn(async move {
        tokio::time::sleep(PERIOD - Duration::from_secs(1)).await;
        let before_first_tick = observer.pushes();
        tokio::time::sleep(Duration::from_secs(2)).await;
        let after_first_tick = observer.pushes();
        stopper.cancel();
        (before_first_tick, after_first_tick)
    });

    let ticks = scheduler.run(&mut machine, &noon, shutdown).await;
    let (before, after) = stop_task.await.unwrap();

    assert_eq!(ticks, 1);
    assert!(before.is_empty());
    assert_eq!(after, vec![true]);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_every_period_until_cancelled() {
    let mut machine = LevelStateMachine::new(
        ScriptedReader::levels(&[WaterLevelState::Low]),
        RecordingSink::default(),
        None,
    );
    let shutdown = CancellationToken::new();
    let scheduler = Scheduler::new(PERIOD);

    let stopper = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(PERIOD * 5 + Duration::from_secs(10)).await;
        stopper.cancel();
    });

    let ticks = scheduler.run(&mut machine, &noon, shutdown).await;
    assert_eq!(ticks, 5);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_first_tick_runs_nothing() {
    let sink = RecordingSink::default();
    let mut machine = LevelStateMachine::new(
        ScriptedReader::levels(&[WaterLevelState::High]),
        sink.clone(),
        None,
    );
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let ticks = Scheduler::new(PERIOD)
        .run(&mut machine, &noon, shutdown)
        .await;

    assert_eq!(ticks, 0);
    assert!(sink.pushes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_uses_clock_for_window_decision() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use water_level_monitor::monitor::NotificationWindow;

    let hour = Arc::new(AtomicU32::new(22));
    let clock_hour = hour.clone();
    let clock = move || at_hour(clock_hour.load(Ordering::SeqCst));

    let sink = RecordingSink::default();
    let mut machine = LevelStateMachine::new(
        ScriptedReader::levels(&[WaterLevelState::High]),
        sink.clone(),
        Some(NotificationWindow::new(9, 21).unwrap()),
    );
    let shutdown = CancellationToken::new();

    let stopper = shutdown.clone();
    let observer = sink.clone();
    let driver = tokio::spawn(async move {
        // First tick at 22:00 defers
        tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;
        let after_night_tick = observer.pushes();
        // Second tick sees the window open
        hour.store(9, Ordering::SeqCst);
        tokio::time::sleep(PERIOD).await;
        stopper.cancel();
        after_night_tick
    });

    let ticks = Scheduler::new(PERIOD)
        .run(&mut machine, &clock, shutdown)
        .await;

    assert_eq!(ticks, 2);
    assert!(driver.await.unwrap().is_empty());
    assert_eq!(sink.pushes(), vec![true]);
}

#[test]
fn test_default_period_is_one_hour() {
    assert_eq!(Scheduler::default().period(), Duration::from_secs(3600));
}
