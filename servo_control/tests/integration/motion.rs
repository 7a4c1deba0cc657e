//! Integration test: profile position and profile velocity cycles.
//!
//! Validates: exact set-point handshakes, precondition checks that reject a
//! command before any write, and position/velocity feedback in user units.

use std::time::Duration;

use servo_common::cia402::{AxisState, WorkMode};
use servo_common::link::{Access, Register};
use servo_control::config::{MotionProfile, ScanRange};
use servo_control::{AxisError, ErrorKind, MotionCommand};
use servo_sim::{LinkCall, SimulatedLink};

use super::{NODE, fast_axis, open_session, single_node_session};

const TIMEOUT: Duration = Duration::from_secs(5);
const POLL: Duration = Duration::from_millis(10);

// ── Profile Position ────────────────────────────────────────────────

#[test]
fn position_cycle_matches_expected_calls() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();
    session.link().clear_journal();

    axis.move_relative(10.0, true).unwrap();
    assert_eq!(
        session.link().calls(),
        vec![
            LinkCall::read(NODE, Register::StatusWord, Access::Pdo),
            LinkCall::read(NODE, Register::ModesOfOperationDisplay, Access::Pdo),
            LinkCall::write(NODE, Register::TargetPosition, 100_000, Access::Pdo),
            LinkCall::write(NODE, Register::ControlWord, 0x6F, Access::Pdo),
            LinkCall::write(NODE, Register::ControlWord, 0x7F, Access::Pdo),
        ]
    );
    assert!(axis.wait_target_reached(TIMEOUT, POLL).unwrap());
    assert_eq!(session.link().position(NODE), Some(100_000));

    let status = axis.get_status().unwrap();
    assert_eq!(status.state, AxisState::OperationEnabled);
    assert!(status.target_reached);
    assert_eq!(status.position, 10.0);
    assert_eq!(status.velocity, 0.0);

    session.link().clear_journal();
    axis.move_absolute(0.0, true).unwrap();
    let writes = session.link().writes();
    assert_eq!(
        writes,
        vec![
            (Register::TargetPosition, 0, Access::Pdo),
            (Register::ControlWord, 0x2F, Access::Pdo),
            (Register::ControlWord, 0x3F, Access::Pdo),
        ]
    );
    assert!(axis.wait_target_reached(TIMEOUT, POLL).unwrap());
    assert_eq!(session.link().position(NODE), Some(0));
}

#[test]
fn move_completes_after_configured_reads() {
    let session = open_session(SimulatedLink::with_reads_per_move([NODE], 3));
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();

    axis.move_absolute(2.5, false).unwrap();
    let outcome = axis.wait_target(TIMEOUT, POLL).unwrap();
    assert!(outcome.reached());
    assert_eq!(outcome.polls(), 3);
    assert_eq!(session.link().position(NODE), Some(25_000));
}

#[test]
fn queued_set_point_runs_after_current() {
    let session = open_session(SimulatedLink::with_reads_per_move([NODE], 2));
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();

    axis.move_absolute(1.0, true).unwrap();
    axis.move_relative(1.0, false).unwrap();

    // Target reached stays low until the queued segment has finished too.
    let outcome = axis.wait_target(TIMEOUT, POLL).unwrap();
    assert!(outcome.reached());
    assert_eq!(outcome.polls(), 3);
    assert_eq!(session.link().position(NODE), Some(20_000));
}

#[test]
fn motion_profile_is_written_in_device_units() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    session.link().clear_journal();

    axis.set_motion_profile(&MotionProfile {
        velocity: 5.0,
        acceleration: 10.0,
        deceleration: 10.0,
    })
    .unwrap();
    assert_eq!(
        session.link().writes(),
        vec![
            (Register::ProfileVelocity, 50_000, Access::Sdo),
            (Register::ProfileAcceleration, 100_000, Access::Sdo),
            (Register::ProfileDeceleration, 100_000, Access::Sdo),
        ]
    );

    let err = axis
        .set_motion_profile(&MotionProfile {
            velocity: 0.0,
            acceleration: 10.0,
            deceleration: 10.0,
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(session.link().write_count(), 3);
}

#[test]
fn limits_and_quick_stop_ramp() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    session.link().clear_journal();

    axis.set_position_limits(-5.0, 5.0).unwrap();
    axis.set_quick_stop_deceleration(100.0).unwrap();
    assert_eq!(
        session.link().writes(),
        vec![
            (Register::SoftwarePositionLimitMin, -50_000, Access::Sdo),
            (Register::SoftwarePositionLimitMax, 50_000, Access::Sdo),
            (Register::QuickStopDeceleration, 1_000_000, Access::Sdo),
        ]
    );

    session.link().clear_journal();
    assert_eq!(
        axis.set_position_limits(5.0, -5.0).unwrap_err().kind(),
        ErrorKind::Configuration
    );
    assert_eq!(
        axis.set_position_limits(f64::NAN, 1.0).unwrap_err().kind(),
        ErrorKind::Configuration
    );
    assert_eq!(
        axis.set_quick_stop_deceleration(0.0).unwrap_err().kind(),
        ErrorKind::Configuration
    );
    assert_eq!(session.link().write_count(), 0);
}

// ── Preconditions ───────────────────────────────────────────────────

#[test]
fn absolute_move_in_velocity_mode_writes_nothing() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfileVelocity).unwrap();
    axis.enable().unwrap();
    let writes_before = session.link().write_count();

    let err = axis.move_absolute(1.0, false).unwrap_err();
    assert_eq!(
        err,
        AxisError::ModeMismatch {
            expected: WorkMode::ProfilePosition,
            observed: 3,
        }
    );
    assert_eq!(err.kind(), ErrorKind::ModeMismatch);
    assert_eq!(session.link().write_count(), writes_before);
}

#[test]
fn motion_while_disabled_is_rejected() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    session.link().clear_journal();

    let err = axis.move_relative(1.0, true).unwrap_err();
    assert_eq!(
        err,
        AxisError::NotEnabled {
            state: AxisState::ReadyToSwitchOn
        }
    );
    assert_eq!(err.kind(), ErrorKind::ModeMismatch);
    assert_eq!(session.link().write_count(), 0);
}

#[test]
fn out_of_range_target_is_rejected_before_any_call() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfilePosition).unwrap();
    axis.enable().unwrap();
    session.link().clear_journal();

    let err = axis
        .dispatch(MotionCommand::AbsoluteMove {
            position: 1.0e9,
            immediate: false,
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(session.link().calls().is_empty());
}

// ── Profile Velocity ────────────────────────────────────────────────

#[test]
fn velocity_cycle_runs_both_directions_and_stops() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.switch_mode(WorkMode::ProfileVelocity).unwrap();
    axis.enable().unwrap();

    for (velocity, counts) in [(3.0, 30_000), (-3.0, -30_000), (0.0, 0)] {
        session.link().clear_journal();
        axis.run_velocity(velocity).unwrap();
        assert_eq!(
            session.link().writes(),
            vec![
                (Register::TargetVelocity, counts, Access::Pdo),
                (Register::ControlWord, 0x0F, Access::Pdo),
            ]
        );
        // Ramp completes after the default number of status reads.
        let outcome = axis.wait_target(TIMEOUT, POLL).unwrap();
        assert!(outcome.reached());
        assert_eq!(axis.get_status().unwrap().velocity, velocity);
    }
}
