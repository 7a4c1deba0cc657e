//! Integration test: drive faults.
//!
//! Validates: a latched fault blocks motion, aborts a wait, and is cleared
//! by the reset sequence.

use std::time::Duration;

use servo_common::cia402::{AxisState, WorkMode};
use servo_common::link::{Access, Register};
use servo_control::config::ScanRange;
use servo_control::{AxisError, ErrorKind, WaitOutcome};
use servo_sim::LinkCall;

use super::{NODE, fast_axis, single_node_session};

#[test]
fn fault_blocks_motion_until_cleared() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();

    session.link().inject_fault(NODE, 0x2310);
    let writes_before = session.link().write_count();
    let err = axis.move_absolute(1.0, false).unwrap_err();
    assert!(matches!(err, AxisError::Fault { status } if status.is_fault()));
    assert_eq!(err.kind(), ErrorKind::Fault);
    assert_eq!(session.link().write_count(), writes_before);
    assert_eq!(axis.last_error_code().unwrap(), 0x2310);

    session.link().clear_journal();
    axis.clear_fault().unwrap();
    assert_eq!(
        session.link().calls(),
        vec![
            LinkCall::write(NODE, Register::ControlWord, 0x00, Access::Sdo),
            LinkCall::write(NODE, Register::ControlWord, 0x80, Access::Sdo),
            LinkCall::read(NODE, Register::StatusWord, Access::Sdo),
        ]
    );
    assert_eq!(
        session.link().drive_state(NODE),
        Some(AxisState::SwitchOnDisabled)
    );
    assert_eq!(axis.last_error_code().unwrap(), 0);

    axis.enable().unwrap();
    axis.move_absolute(1.0, false).unwrap();
    assert!(
        axis.wait_target_reached(Duration::from_secs(5), Duration::from_millis(10))
            .unwrap()
    );
}

#[test]
fn fault_during_wait_ends_the_wait() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();
    axis.move_relative(5.0, true).unwrap();

    session.link().inject_fault(NODE, 0x7500);
    let outcome = axis
        .wait_target(Duration::from_secs(5), Duration::from_millis(10))
        .unwrap();
    let WaitOutcome::Faulted { status, polls } = outcome else {
        panic!("expected fault, got {outcome:?}");
    };
    assert_eq!(polls, 1);
    assert_eq!(status.state(), AxisState::Fault);
    assert_eq!(
        outcome.into_result().unwrap_err().kind(),
        ErrorKind::Fault
    );

    // Latched after the reaction; the boolean form reports false.
    assert!(
        !axis
            .wait_target_reached(Duration::from_secs(5), Duration::from_millis(10))
            .unwrap()
    );
}

#[test]
fn get_status_reports_fault_state() {
    let session = single_node_session();
    let axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    session.link().inject_fault(NODE, 0x5530);

    let status = axis.get_status().unwrap();
    assert_eq!(status.state, AxisState::Fault);
    assert!(status.status_word.is_fault());
    assert!(!status.target_reached);
}
