//! Integration test: power stage and work mode sequencing.
//!
//! Validates: the enable/disable control word order, the mode switch
//! sequence and its echo check, and quick stop.

use servo_common::cia402::{AxisState, WorkMode};
use servo_common::link::{Access, Register};
use servo_control::config::ScanRange;
use servo_control::{AxisError, ErrorKind};
use servo_sim::{LinkCall, SimulatedLink};

use super::{NODE, fast_axis, open_session, single_node_session};

#[test]
fn enable_writes_three_words_then_checks_status_once() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    session.link().clear_journal();

    let status = axis.enable().expect("enable confirmed");
    assert!(status.is_power_enabled());
    assert_eq!(status.state(), AxisState::OperationEnabled);

    assert_eq!(
        session.link().calls(),
        vec![
            LinkCall::write(NODE, Register::ControlWord, 0x06, Access::Sdo),
            LinkCall::write(NODE, Register::ControlWord, 0x07, Access::Sdo),
            LinkCall::write(NODE, Register::ControlWord, 0x2F, Access::Sdo),
            LinkCall::read(NODE, Register::StatusWord, Access::Pdo),
        ]
    );
    assert_eq!(
        session.link().drive_state(NODE),
        Some(AxisState::OperationEnabled)
    );
}

#[test]
fn disable_is_single_power_off() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.enable().unwrap();
    session.link().clear_journal();

    axis.disable().unwrap();
    assert_eq!(
        session.link().calls(),
        vec![LinkCall::write(NODE, Register::ControlWord, 0x06, Access::Sdo)]
    );
    assert_eq!(
        session.link().drive_state(NODE),
        Some(AxisState::ReadyToSwitchOn)
    );
}

#[test]
fn enable_failure_is_power_stage_error() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    // Power stays off when the enable word never lands.
    session
        .link()
        .fail_writes(NODE, Some(Register::ControlWord));
    let err = axis.enable().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);

    session.link().fail_writes(NODE, None);
    session.link().inject_fault(NODE, 0x7500);
    let err = axis.enable().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fault);
}

#[test]
fn switch_mode_sequence_is_idempotent() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    let expected = vec![
        LinkCall::write(NODE, Register::ControlWord, 0x06, Access::Sdo),
        LinkCall::write(NODE, Register::ModesOfOperation, 1, Access::Sdo),
        LinkCall::read(NODE, Register::ModesOfOperationDisplay, Access::Sdo),
    ];

    for _ in 0..2 {
        session.link().clear_journal();
        axis.switch_mode(WorkMode::ProfilePosition).unwrap();
        assert_eq!(session.link().calls(), expected);
    }
    assert_eq!(axis.confirmed_mode(), Some(WorkMode::ProfilePosition));
    assert_eq!(axis.active_mode().unwrap(), Some(WorkMode::ProfilePosition));
}

#[test]
fn switch_mode_from_enabled_powers_off_first() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();

    axis.switch_mode(WorkMode::ProfileVelocity).unwrap();
    assert_eq!(axis.confirmed_mode(), Some(WorkMode::ProfileVelocity));
    assert_eq!(
        session.link().drive_state(NODE),
        Some(AxisState::ReadyToSwitchOn)
    );
}

#[test]
fn wrong_mode_echo_is_mode_mismatch() {
    let link = SimulatedLink::with_nodes([NODE]);
    link.set_mode_echo(NODE, Some(3));
    let session = open_session(link);
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();

    let err = axis.switch_mode(WorkMode::ProfilePosition).unwrap_err();
    assert_eq!(
        err,
        AxisError::ModeMismatch {
            expected: WorkMode::ProfilePosition,
            observed: 3,
        }
    );
    assert_eq!(err.kind(), ErrorKind::ModeMismatch);
    assert_eq!(axis.confirmed_mode(), None);
}

#[test]
fn quick_stop_from_operation_enabled() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();
    session.link().clear_journal();

    axis.quick_stop().unwrap();
    assert_eq!(
        session.link().calls(),
        vec![LinkCall::write(NODE, Register::ControlWord, 0x02, Access::Sdo)]
    );
    assert_eq!(
        session.link().drive_state(NODE),
        Some(AxisState::QuickStopActive)
    );
}
