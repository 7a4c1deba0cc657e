//! Scenario tests and their shared fixtures.

mod brake;
mod faults;
mod lifecycle;
mod motion;
mod power_and_mode;
mod waiting;

use servo_common::link::NodeId;
use servo_control::config::{AxisConfig, LinkConfig, SettleTimes};
use servo_control::Session;
use servo_sim::SimulatedLink;

pub const NODE: NodeId = NodeId::new_const(1);

/// Axis on node 1 with vendor defaults and no settle delays.
pub fn fast_axis() -> AxisConfig {
    let mut axis = AxisConfig::new(NODE);
    axis.timing = SettleTimes::ZERO;
    axis
}

/// Connected session over `link` with no settle delays.
pub fn open_session(link: SimulatedLink) -> Session<SimulatedLink> {
    Session::open(link, &LinkConfig::default())
        .expect("session opens")
        .with_timing(SettleTimes::ZERO)
}

/// Connected session over a simulator with node 1 present.
pub fn single_node_session() -> Session<SimulatedLink> {
    open_session(SimulatedLink::with_nodes([NODE]))
}
