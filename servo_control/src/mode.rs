//! Work mode selection.
//!
//! The drive refuses mode changes while operation is enabled, so every
//! switch starts with a shutdown, even when the axis is already off.

use std::thread;

use servo_common::cia402::WorkMode;
use servo_common::link::{Access, DeviceLink, Register};
use tracing::{info, warn};

use crate::config::SettleTimes;
use crate::error::{AxisError, AxisResult};
use crate::port::NodePort;
use crate::power;

/// Tracks the last work mode confirmed by the drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeController {
    confirmed: Option<WorkMode>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last mode echoed back by the drive, if any.
    pub fn confirmed(&self) -> Option<WorkMode> {
        self.confirmed
    }

    /// Power off, write `target`, wait, and verify the mode display echo.
    ///
    /// Repeating the call with the same mode runs the full sequence again.
    ///
    /// # Errors
    ///
    /// `ModeMismatch` carrying the observed code when the echo differs;
    /// link errors from any step.
    pub fn switch_mode<L: DeviceLink>(
        &mut self,
        port: &NodePort<'_, L>,
        target: WorkMode,
        timing: &SettleTimes,
    ) -> AxisResult<()> {
        self.confirmed = None;
        power::disable(port, timing.power_off())?;

        let code = i32::from(target.code());
        port.write(Register::ModesOfOperation, code, Access::Sdo)?;
        thread::sleep(timing.mode_switch());

        let observed = port.read(Register::ModesOfOperationDisplay, Access::Sdo)?;
        if observed != code {
            warn!(node = %port.node(), expected = %target, observed, "Mode not echoed");
            return Err(AxisError::ModeMismatch {
                expected: target,
                observed,
            });
        }

        self.confirmed = Some(target);
        info!(node = %port.node(), mode = %target, "Work mode set");
        Ok(())
    }
}

/// Read the mode display and map it to a known mode.
pub fn read_active_mode<L: DeviceLink>(
    port: &NodePort<'_, L>,
    access: Access,
) -> AxisResult<Option<WorkMode>> {
    let code = port.read(Register::ModesOfOperationDisplay, access)?;
    Ok(WorkMode::from_code(code))
}
