mod common;

use common::{RecordingSink, ScriptedReader, at_hour};
use water_level_monitor::monitor::{
    AlarmDeliveryState, LevelStateMachine, NotificationWindow, TickResult, WaterLevelState,
};

use WaterLevelState::{High, Low};

fn window_9_to_21() -> Option<NotificationWindow> {
    Some(NotificationWindow::new(9, 21).unwrap())
}

fn run(
    machine: &mut LevelStateMachine<ScriptedReader, RecordingSink>,
    hours: &[u32],
) -> Vec<TickResult> {
    hours.iter().map(|&h| machine.tick(at_hour(h))).collect()
}

#[test]
fn test_night_alarm_cleared_before_window_opens() {
    let sink = RecordingSink::default();
    let mut machine = LevelStateMachine::new(
        ScriptedReader::levels(&[Low, Low, High, High, Low]),
        sink.clone(),
        window_9_to_21(),
    );

    let results = run(&mut machine, &[10, 10, 22, 23, 8]);

    assert_eq!(
        results,
        vec![
            TickResult::NoChange,
            TickResult::NoChange,
            TickResult::AlarmDeferred,
            TickResult::NoChange,
            TickResult::AlarmCleared,
        ]
    );
    assert_eq!(sink.pushes(), vec![false]);
}

#[test]
fn test_alarm_raised_inside_window() {
    let sink = RecordingSink::default();
    let mut machine = LevelStateMachine::new(
        ScriptedReader::levels(&[Low, High]),
        sink.clone(),
        window_9_to_21(),
    );

    assert_eq!(
        run(&mut machine, &[10, 10]),
        vec![TickResult::NoChange, TickResult::AlarmRaised]
    );
    assert_eq!(sink.pushes(), vec![true]);
}

#[test]
fn test_deferred_alarm_delivered_exactly_once() {
    let sink = RecordingSink::default();
    let mut machine = LevelStateMachine::new(
        ScriptedReader::levels(&[High, High, High, High, High]),
        sink.clone(),
        window_9_to_21(),
    );

    let results = run(&mut machine, &[22, 23, 0, 9, 10]);

    assert_eq!(
        results,
        vec![
            TickResult::AlarmDeferred,
            TickResult::NoChange,
            TickResult::NoChange,
            TickResult::DeferredAlarmDelivered,
            TickResult::NoChange,
        ]
    );
    assert_eq!(sink.pushes(), vec![true]);
    assert_eq!(
        machine.session().last_delivered_alarm(),
        AlarmDeliveryState::Delivered
    );
}

#[test]
fn test_clear_is_pushed_at_any_hour() {
    for hour in [0, 8, 9, 20, 21, 23] {
        let sink = RecordingSink::default();
        let mut machine = LevelStateMachine::new(
            ScriptedReader::levels(&[High, Low]),
            sink.clone(),
            window_9_to_21(),
        );

        machine.tick(at_hour(12));
        assert_eq!(machine.tick(at_hour(hour)), TickResult::AlarmCleared);
        assert_eq!(sink.pushes(), vec![true, false], "hour {}", hour);
    }
}

#[test]
fn test_clear_after_undelivered_alarm_still_pushes_zero() {
    let sink = RecordingSink::default();
    let mut machine = LevelStateMachine::new(
        ScriptedReader::levels(&[High, Low]),
        sink.clone(),
        window_9_to_21(),
    );

    assert_eq!(machine.tick(at_hour(3)), TickResult::AlarmDeferred);
    assert_eq!(machine.tick(at_hour(4)), TickResult::AlarmCleared);
    assert_eq!(sink.pushes(), vec![false]);
}

#[test]
fn test_steady_state_produces_no_duplicate_pushes() {
    let sink = RecordingSink::default();
    let mut machine =
        LevelStateMachine::new(ScriptedReader::levels(&[High; 24]), sink.clone(), None);

    let results = run(&mut machine, &(0..24).collect::<Vec<_>>());

    assert_eq!(results[0], TickResult::AlarmRaised);
    assert!(results[1..].iter().all(|r| *r == TickResult::NoChange));
    assert_eq!(sink.pushes(), vec![true]);
}

#[test]
fn test_last_observed_level_follows_successful_reads() {
    let script = [
        Some(High),
        None,
        Some(Low),
        None,
        None,
        Some(High),
        Some(High),
        None,
    ];
    let mut machine = LevelStateMachine::new(
        ScriptedReader::new(script),
        RecordingSink::default(),
        window_9_to_21(),
    );

    let mut expected = Low;
    for (i, reading) in script.iter().enumerate() {
        let result = machine.tick(at_hour(i as u32));
        match reading {
            Some(level) => expected = *level,
            None => assert_eq!(result, TickResult::Skipped),
        }
        assert_eq!(machine.session().last_observed_level(), expected);
    }
}

#[test]
fn test_sensor_fault_leaves_session_unchanged() {
    let mut machine = LevelStateMachine::new(
        ScriptedReader::new([Some(High), None]),
        RecordingSink::default(),
        window_9_to_21(),
    );

    machine.tick(at_hour(22));
    let before = machine.session().clone();

    assert_eq!(machine.tick(at_hour(10)), TickResult::Skipped);
    assert_eq!(*machine.session(), before);
    assert!(machine.sink().pushes().is_empty());
}

#[test]
fn test_sink_outage_keeps_alarm_pending_until_write_succeeds() {
    let sink = RecordingSink::default();
    sink.set_offline(true);
    let mut machine = LevelStateMachine::new(
        ScriptedReader::levels(&[High, High, High]),
        sink.clone(),
        None,
    );

    assert_eq!(
        machine.tick(at_hour(10)),
        TickResult::DeliveryFailed { value: true }
    );
    assert_eq!(
        machine.tick(at_hour(11)),
        TickResult::DeliveryFailed { value: true }
    );
    assert!(machine.session().has_pending_alarm());

    sink.set_offline(false);
    assert_eq!(
        machine.tick(at_hour(12)),
        TickResult::DeferredAlarmDelivered
    );
    assert_eq!(sink.pushes(), vec![true]);
}

#[test]
fn test_empty_window_defers_forever() {
    let sink = RecordingSink::default();
    let mut machine = LevelStateMachine::new(
        ScriptedReader::levels(&[High; 24]),
        sink.clone(),
        Some(NotificationWindow::new(12, 12).unwrap()),
    );

    let results = run(&mut machine, &(0..24).collect::<Vec<_>>());

    assert_eq!(results[0], TickResult::AlarmDeferred);
    assert!(sink.pushes().is_empty());
}
