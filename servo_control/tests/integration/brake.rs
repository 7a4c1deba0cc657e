//! Integration test: holding brake interlock.
//!
//! Validates: motion is refused while the brake is engaged, the digital
//! output levels for both wirings, and the release/engage bracket around
//! a move.

use std::time::Duration;

use servo_common::cia402::WorkMode;
use servo_common::link::{Access, Register};
use servo_control::config::{BrakeConfig, OutputLevel, ScanRange};
use servo_control::{AxisConfig, AxisError, BrakeState, ErrorKind};
use servo_sim::LinkCall;

use super::{NODE, fast_axis, single_node_session};

fn braked_axis(release_level: OutputLevel, output_bit: u8) -> AxisConfig {
    let mut config = fast_axis();
    config.brake = Some(BrakeConfig {
        output_bit,
        release_level,
    });
    config
}

#[test]
fn engaged_brake_blocks_motion_without_device_calls() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&braked_axis(OutputLevel::High, 0), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();
    assert_eq!(axis.brake_state(), Some(BrakeState::Engaged));
    session.link().clear_journal();

    let err = axis.move_absolute(5.0, true).unwrap_err();
    assert_eq!(err, AxisError::BrakeEngaged { node: NODE });
    assert_eq!(err.kind(), ErrorKind::ModeMismatch);
    assert!(session.link().calls().is_empty());

    // A zero-distance move does not move the axis and passes the interlock.
    axis.move_relative(0.0, true).unwrap();
}

#[test]
fn release_move_engage_bracket() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&braked_axis(OutputLevel::High, 0), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();
    session.link().clear_journal();

    axis.release_brake().unwrap();
    assert_eq!(axis.brake_state(), Some(BrakeState::Released));
    assert_eq!(session.link().digital_outputs(NODE), Some(0x01));

    axis.move_relative(10.0, true).unwrap();
    assert!(
        axis.wait_target_reached(Duration::from_secs(5), Duration::from_millis(10))
            .unwrap()
    );

    axis.engage_brake().unwrap();
    assert_eq!(axis.brake_state(), Some(BrakeState::Engaged));
    assert_eq!(session.link().digital_outputs(NODE), Some(0x00));

    let writes = session.link().writes();
    assert_eq!(writes.first(), Some(&(Register::DigitalOutputs, 0x01, Access::Sdo)));
    assert_eq!(writes.last(), Some(&(Register::DigitalOutputs, 0x00, Access::Sdo)));
}

#[test]
fn active_low_brake_on_higher_bit() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&braked_axis(OutputLevel::Low, 2), &ScanRange::default())
        .unwrap();

    axis.engage_brake().unwrap();
    assert_eq!(session.link().digital_outputs(NODE), Some(0x04));
    axis.release_brake().unwrap();
    assert_eq!(session.link().digital_outputs(NODE), Some(0x00));
}

#[test]
fn axis_without_brake_ignores_brake_calls() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    session.link().clear_journal();

    axis.release_brake().unwrap();
    axis.engage_brake().unwrap();
    assert_eq!(axis.brake_state(), None);
    assert!(session.link().calls().is_empty());
}

#[test]
fn full_position_cycle_call_sequence() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&braked_axis(OutputLevel::High, 0), &ScanRange::default())
        .unwrap();
    session.link().clear_journal();

    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();
    axis.release_brake().unwrap();
    axis.move_relative(10.0, true).unwrap();
    assert!(
        axis.wait_target_reached(Duration::from_secs(5), Duration::from_millis(10))
            .unwrap()
    );
    axis.engage_brake().unwrap();
    axis.disable().unwrap();

    let status_poll = LinkCall::read(NODE, Register::StatusWord, Access::Pdo);
    let mut expected = vec![
        // switch_mode
        LinkCall::write(NODE, Register::ControlWord, 0x06, Access::Sdo),
        LinkCall::write(NODE, Register::ModesOfOperation, 1, Access::Sdo),
        LinkCall::read(NODE, Register::ModesOfOperationDisplay, Access::Sdo),
        // enable
        LinkCall::write(NODE, Register::ControlWord, 0x06, Access::Sdo),
        LinkCall::write(NODE, Register::ControlWord, 0x07, Access::Sdo),
        LinkCall::write(NODE, Register::ControlWord, 0x2F, Access::Sdo),
        status_poll.clone(),
        // release_brake
        LinkCall::write(NODE, Register::DigitalOutputs, 0x01, Access::Sdo),
        // move_relative
        status_poll.clone(),
        LinkCall::read(NODE, Register::ModesOfOperationDisplay, Access::Pdo),
        LinkCall::write(NODE, Register::TargetPosition, 100_000, Access::Pdo),
        LinkCall::write(NODE, Register::ControlWord, 0x6F, Access::Pdo),
        LinkCall::write(NODE, Register::ControlWord, 0x7F, Access::Pdo),
    ];
    // wait_target_reached
    let polls = session.link().reads_per_move() as usize;
    expected.extend(std::iter::repeat_n(status_poll, polls));
    expected.extend([
        // engage_brake
        LinkCall::write(NODE, Register::DigitalOutputs, 0x00, Access::Sdo),
        // disable
        LinkCall::write(NODE, Register::ControlWord, 0x06, Access::Sdo),
    ]);
    assert_eq!(session.link().calls(), expected);
}
