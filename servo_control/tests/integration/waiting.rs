//! Integration test: bounded target waits.
//!
//! Validates: the poll count and elapsed time of a wait that never
//! completes, and the single-read target check.

use std::time::Duration;

use servo_common::cia402::WorkMode;
use servo_common::link::Register;
use servo_control::config::ScanRange;
use servo_control::{ErrorKind, WaitOutcome};
use servo_sim::SimulatedLink;

use super::{NODE, fast_axis, open_session};

#[test]
fn unreachable_target_times_out_after_about_ten_polls() {
    let link = SimulatedLink::with_nodes([NODE]);
    link.set_never_reach(NODE, true);
    let session = open_session(link);
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();
    axis.move_relative(10.0, true).unwrap();
    session.link().clear_journal();

    let outcome = axis
        .wait_target(Duration::from_secs(1), Duration::from_millis(100))
        .unwrap();
    let WaitOutcome::TimedOut { polls, elapsed } = outcome else {
        panic!("expected timeout, got {outcome:?}");
    };
    assert!((9..=11).contains(&polls), "polls = {polls}");
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_millis(1500), "elapsed = {elapsed:?}");
    assert_eq!(session.link().read_count(Register::StatusWord), polls as usize);

    let err = outcome.into_result().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[test]
fn boolean_wait_reports_false_on_timeout() {
    let link = SimulatedLink::with_nodes([NODE]);
    link.set_never_reach(NODE, true);
    let session = open_session(link);
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();
    axis.move_absolute(3.0, false).unwrap();

    let reached = axis
        .wait_target_reached(Duration::from_millis(50), Duration::from_millis(10))
        .unwrap();
    assert!(!reached);
    assert!(!axis.check_target_reached().unwrap());
}

#[test]
fn zero_poll_interval_is_configuration_error() {
    let session = open_session(SimulatedLink::with_nodes([NODE]));
    let axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    session.link().clear_journal();

    let err = axis
        .wait_target(Duration::from_secs(1), Duration::ZERO)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(session.link().calls().is_empty());
}

#[test]
fn idle_axis_reports_target_reached() {
    let session = open_session(SimulatedLink::with_nodes([NODE]));
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();

    assert!(axis.check_target_reached().unwrap());
    let outcome = axis
        .wait_target(Duration::from_secs(1), Duration::from_millis(10))
        .unwrap();
    assert_eq!(outcome.polls(), 1);
}
