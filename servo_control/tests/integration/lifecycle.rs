//! Integration test: master lifecycle and axis initialization.
//!
//! Validates: the initialization call order, online checks, rejected
//! configuration before any device call, and best-effort teardown.

use std::sync::Arc;
use std::time::Duration;

use servo_common::consts::DEFAULT_SAVE_TIMEOUT;
use servo_common::link::{
    Access, ConnectionDescriptor, LinkError, MasterState, NodeId, Register, TransportKind,
};
use servo_common::units::UnitsFactor;
use servo_control::config::{LinkConfig, ScanRange, SettleTimes};
use servo_control::{AxisError, ErrorKind, Session};
use servo_sim::{LinkCall, SimulatedLink};

use super::{NODE, fast_axis, open_session, single_node_session};

// ── Initialization ──────────────────────────────────────────────────

#[test]
fn initialize_axis_issues_calls_in_order() {
    let session = single_node_session();
    let axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .expect("axis initializes");
    assert_eq!(axis.node(), NODE);

    let factor = UnitsFactor::new(10_000.0).unwrap();
    let connection = ConnectionDescriptor::default()
        .to_connection_string()
        .unwrap();
    let expected = vec![
        LinkCall::CreateMaster(TransportKind::CanOpen),
        LinkCall::Connect(connection),
        LinkCall::SetMasterState(MasterState::PreOperational),
        LinkCall::ScanNodes {
            from: NodeId::new(1).unwrap(),
            to: NodeId::new(10).unwrap(),
        },
        LinkCall::IsOnline(NODE),
        LinkCall::LoadParameterSet {
            node: NODE,
            db_name: "CANopen.db".to_string(),
        },
        LinkCall::ReadPdoConfig(NODE),
        LinkCall::write(NODE, Register::UnitsFactor, factor.to_register(), Access::Sdo),
        LinkCall::write(NODE, Register::ControlWord, 0x00, Access::Sdo),
        LinkCall::write(NODE, Register::ControlWord, 0x80, Access::Sdo),
        LinkCall::read(NODE, Register::StatusWord, Access::Sdo),
        LinkCall::SetMasterState(MasterState::Operational),
    ];
    assert_eq!(session.link().calls(), expected);
    assert_eq!(session.nodes(), vec![NODE]);
    assert_eq!(
        session.link().parameter_db(NODE).as_deref(),
        Some("CANopen.db")
    );
    assert_eq!(
        session.link().master_state(session.master()),
        Some(MasterState::Operational)
    );
}

#[test]
fn units_factor_reads_back_from_drive() {
    let session = single_node_session();
    let mut config = fast_axis();
    config.units_factor = UnitsFactor::new(4_096.0).unwrap();
    let axis = session
        .initialize_axis(&config, &ScanRange::default())
        .unwrap();

    assert_eq!(axis.units_factor().get(), 4_096.0);
    assert_eq!(axis.read_units_factor().unwrap().get(), 4_096.0);
}

#[test]
fn inexact_units_factor_matches_drive_copy() {
    let session = single_node_session();
    let mut config = fast_axis();
    config.units_factor = UnitsFactor::new(3.7).unwrap();
    let axis = session
        .initialize_axis(&config, &ScanRange::default())
        .unwrap();

    assert_eq!(axis.units_factor(), axis.read_units_factor().unwrap());
    assert_eq!(axis.units_factor().get(), f64::from(3.7f32));
}

#[test]
fn offline_node_is_not_online() {
    let link = SimulatedLink::with_nodes([NODE]);
    link.set_offline(NODE, true);
    let session = open_session(link);

    let err = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap_err();
    assert_eq!(err, AxisError::NotOnline { node: NODE });
    assert_eq!(err.kind(), ErrorKind::NotOnline);

    let calls = session.link().calls();
    assert_eq!(calls.last(), Some(&LinkCall::IsOnline(NODE)));
    assert!(
        !calls
            .iter()
            .any(|c| matches!(c, LinkCall::LoadParameterSet { .. })),
        "no parameter load after a failed online check"
    );
    assert!(session.nodes().is_empty());
}

#[test]
fn node_outside_scan_range_is_rejected_before_link_calls() {
    let session = single_node_session();
    let calls_before = session.link().calls().len();

    let scan = ScanRange::new(NodeId::new(5).unwrap(), NodeId::new(10).unwrap()).unwrap();
    let err = session.initialize_axis(&fast_axis(), &scan).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(session.link().calls().len(), calls_before);
}

#[test]
fn absent_node_is_not_online() {
    let session = open_session(SimulatedLink::with_nodes([NodeId::new(2).unwrap()]));
    let err = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotOnline);
}

// ── Master ──────────────────────────────────────────────────────────

#[test]
fn refused_connect_is_transport_error() {
    let link = SimulatedLink::with_nodes([NODE]);
    link.refuse_connect(true);

    let err = Session::open(link, &LinkConfig::default()).unwrap_err();
    assert_eq!(err, AxisError::Transport(LinkError::NoAvailableDevice));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[test]
fn unsupported_transport_fails_master_creation() {
    let err = Session::init(SimulatedLink::with_nodes([NODE]), TransportKind::Modbus).unwrap_err();
    assert_eq!(
        err,
        AxisError::Transport(LinkError::UnsupportedTransport(TransportKind::Modbus))
    );
}

#[test]
fn malformed_descriptor_makes_no_connect_call() {
    let mut session = Session::init(SimulatedLink::with_nodes([NODE]), TransportKind::CanOpen)
        .unwrap();
    let descriptor = ConnectionDescriptor {
        device_type: String::new(),
        ..ConnectionDescriptor::default()
    };

    let err = session.connect(&descriptor).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(
        !session
            .link()
            .calls()
            .iter()
            .any(|c| matches!(c, LinkCall::Connect(_)))
    );
}

// ── Teardown ────────────────────────────────────────────────────────

#[test]
fn close_powers_off_then_tears_master_down() {
    let session = single_node_session();
    let axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    drop(axis);
    session.link().clear_journal();

    let link = session.close().expect("clean teardown");
    assert_eq!(
        link.calls(),
        vec![
            LinkCall::write(NODE, Register::ControlWord, 0x06, Access::Sdo),
            LinkCall::SetMasterState(MasterState::PreOperational),
            LinkCall::StopMaster,
            LinkCall::DestroyMaster,
        ]
    );
    assert_eq!(link.master_count(), 0);
}

#[test]
fn axis_close_disables_before_session_close() {
    let session = single_node_session();
    let mut axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    axis.enable().unwrap();
    axis.close().unwrap();

    let link = session.close().unwrap();
    let control_words: Vec<i32> = link
        .writes()
        .into_iter()
        .filter(|(reg, _, _)| *reg == Register::ControlWord)
        .map(|(_, value, _)| value)
        .collect();
    assert_eq!(control_words[control_words.len() - 2..], [0x06, 0x06]);
}

#[test]
fn teardown_continues_after_failed_step() {
    let link = Arc::new(SimulatedLink::with_nodes([NODE]));
    let session = Session::open(Arc::clone(&link), &LinkConfig::default())
        .unwrap()
        .with_timing(SettleTimes::ZERO);
    let axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();
    drop(axis);
    link.fail_writes(NODE, Some(Register::ControlWord));
    link.clear_journal();

    let err = session.close().unwrap_err();
    assert_eq!(
        err,
        AxisError::Transport(LinkError::SdoWriteFailed(Register::ControlWord))
    );
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(
        link.calls(),
        vec![
            LinkCall::write(NODE, Register::ControlWord, 0x06, Access::Sdo),
            LinkCall::SetMasterState(MasterState::PreOperational),
            LinkCall::StopMaster,
            LinkCall::DestroyMaster,
        ]
    );
    assert_eq!(link.master_count(), 0);
}

#[test]
fn save_parameters_reaches_the_drive() {
    let session = single_node_session();
    let axis = session
        .initialize_axis(&fast_axis(), &ScanRange::default())
        .unwrap();

    axis.save_parameters(DEFAULT_SAVE_TIMEOUT).unwrap();
    assert_eq!(session.link().save_count(NODE), 1);

    let err = axis.save_parameters(Duration::ZERO).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(session.link().save_count(NODE), 1);
}
