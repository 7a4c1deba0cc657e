//! Power stage sequencing.
//!
//! Control words go out over SDO so each transition is confirmed by the
//! node before the next one is written.

use std::thread;
use std::time::Duration;

use servo_common::cia402::{encode, PowerRequest, StatusWord};
use servo_common::link::{Access, DeviceLink};
use tracing::{debug, error, info, warn};

use crate::error::{AxisError, AxisResult};
use crate::port::NodePort;

/// Shutdown, switch on, enable operation; then one bounded status check
/// after `settle`.
///
/// # Errors
///
/// `Fault` if the drive reports a fault, `EnableFailed` if the status word
/// does not match `0x6F == 0x27`.
pub fn enable<L: DeviceLink>(port: &NodePort<'_, L>, settle: Duration) -> AxisResult<StatusWord> {
    for request in [
        PowerRequest::PowerOff,
        PowerRequest::SwitchOn,
        PowerRequest::PowerOn,
    ] {
        port.write_control(encode(request), Access::Sdo)?;
    }
    thread::sleep(settle);

    let status = port.read_status(Access::Pdo)?;
    if status.is_fault() {
        error!(node = %port.node(), %status, "Drive fault during enable");
        return Err(AxisError::Fault { status });
    }
    if !status.is_power_enabled() {
        warn!(node = %port.node(), %status, state = %status.state(), "Enable not confirmed");
        return Err(AxisError::EnableFailed { status });
    }
    info!(node = %port.node(), %status, "Power stage enabled");
    Ok(status)
}

/// Shutdown command followed by the power-off settle delay.
pub fn disable<L: DeviceLink>(port: &NodePort<'_, L>, settle: Duration) -> AxisResult<()> {
    port.write_control(encode(PowerRequest::PowerOff), Access::Sdo)?;
    thread::sleep(settle);
    debug!(node = %port.node(), "Power stage off");
    Ok(())
}

/// Remove voltage, pulse fault reset and confirm the fault cleared.
pub fn clear_fault<L: DeviceLink>(port: &NodePort<'_, L>) -> AxisResult<StatusWord> {
    port.write_control(encode(PowerRequest::DisableVoltage), Access::Sdo)?;
    port.write_control(encode(PowerRequest::FaultReset), Access::Sdo)?;
    let status = port.read_status(Access::Sdo)?;
    if status.is_fault() {
        error!(node = %port.node(), %status, "Fault persists after reset");
        return Err(AxisError::Fault { status });
    }
    debug!(node = %port.node(), %status, "Fault cleared");
    Ok(status)
}

/// Quick stop ramp.
pub fn quick_stop<L: DeviceLink>(port: &NodePort<'_, L>) -> AxisResult<()> {
    port.write_control(encode(PowerRequest::QuickStop), Access::Sdo)?;
    warn!(node = %port.node(), "Quick stop issued");
    Ok(())
}
