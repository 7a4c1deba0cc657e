//! Axis handle: the application-facing surface for one servo axis.
//!
//! An `AxisHandle` borrows the [`Session`](crate::session::Session) that
//! initialized it and cannot outlive the master it talks to. Commands take
//! `&mut self`; one controller drives one axis at a time.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use servo_common::cia402::{AxisState, StatusWord, WorkMode};
use servo_common::config::ConfigError;
use servo_common::link::{Access, DeviceLink, NodeId, Register};
use servo_common::units::UnitsFactor;
use tracing::{debug, error, info, warn};

use crate::brake::{BrakeSequencer, BrakeState};
use crate::config::{AxisConfig, MotionProfile, SettleTimes};
use crate::error::{AxisError, AxisResult};
use crate::mode::{self, ModeController};
use crate::monitor::{TargetMonitor, WaitOutcome};
use crate::motion::{self, MotionCommand};
use crate::port::NodePort;
use crate::power;

/// One status poll, converted to user units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(with = "status_word_serde")]
    pub status_word: StatusWord,
    pub state: AxisState,
    pub target_reached: bool,
    /// User units.
    pub position: f64,
    /// User units per second.
    pub velocity: f64,
}

mod status_word_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use servo_common::cia402::StatusWord;

    pub fn serialize<S: Serializer>(status: &StatusWord, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u16(status.raw())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<StatusWord, D::Error> {
        u16::deserialize(d).map(StatusWord::from_raw)
    }
}

/// Live handle to an initialized axis.
#[derive(Debug)]
pub struct AxisHandle<'s, L: DeviceLink> {
    port: NodePort<'s, L>,
    factor: UnitsFactor,
    brake: Option<BrakeSequencer>,
    timing: SettleTimes,
    modes: ModeController,
}

impl<'s, L: DeviceLink> AxisHandle<'s, L> {
    pub(crate) fn new(port: NodePort<'s, L>, config: &AxisConfig) -> AxisResult<Self> {
        let brake = config
            .brake
            .map(|brake| BrakeSequencer::new(brake, config.timing.brake()))
            .transpose()?;
        Ok(Self {
            port,
            factor: config.units_factor,
            brake,
            timing: config.timing,
            modes: ModeController::new(),
        })
    }

    pub fn node(&self) -> NodeId {
        self.port.node()
    }

    // ─── Mode & Power ───────────────────────────────────────────────

    /// Power off, select `mode` and verify the echo.
    pub fn switch_mode(&mut self, mode: WorkMode) -> AxisResult<()> {
        self.modes.switch_mode(&self.port, mode, &self.timing)
    }

    /// Last mode confirmed by `switch_mode`.
    pub fn confirmed_mode(&self) -> Option<WorkMode> {
        self.modes.confirmed()
    }

    /// Mode currently shown by the drive; `None` for codes outside the set.
    pub fn active_mode(&self) -> AxisResult<Option<WorkMode>> {
        mode::read_active_mode(&self.port, Access::Sdo)
    }

    /// Enable the power stage; returns the confirming status word.
    pub fn enable(&mut self) -> AxisResult<StatusWord> {
        power::enable(&self.port, self.timing.power_on())
    }

    /// Shut the power stage down.
    pub fn disable(&mut self) -> AxisResult<()> {
        if self.brake_state() == Some(BrakeState::Released) {
            warn!(node = %self.node(), "Disabling with brake released");
        }
        power::disable(&self.port, self.timing.power_off())
    }

    // ─── Motion ─────────────────────────────────────────────────────

    pub fn move_absolute(&mut self, position: f64, immediate: bool) -> AxisResult<()> {
        self.dispatch(MotionCommand::AbsoluteMove {
            position,
            immediate,
        })
    }

    pub fn move_relative(&mut self, distance: f64, immediate: bool) -> AxisResult<()> {
        self.dispatch(MotionCommand::RelativeMove {
            distance,
            immediate,
        })
    }

    /// Constant-velocity run in user units/s; the sign selects direction.
    pub fn run_velocity(&mut self, velocity: f64) -> AxisResult<()> {
        self.dispatch(MotionCommand::VelocityRun {
            signed_velocity: velocity,
        })
    }

    /// Issue `command`, refusing moving commands while the brake is engaged.
    pub fn dispatch(&mut self, command: MotionCommand) -> AxisResult<()> {
        if command.moves_axis() && self.brake_state() == Some(BrakeState::Engaged) {
            warn!(node = %self.node(), %command, "Motion rejected: brake engaged");
            return Err(AxisError::BrakeEngaged { node: self.node() });
        }
        motion::dispatch(&self.port, self.factor, command)
    }

    // ─── Brake ──────────────────────────────────────────────────────

    /// Release the brake. No-op without a configured brake.
    pub fn release_brake(&mut self) -> AxisResult<()> {
        match self.brake.as_mut() {
            Some(brake) => brake.release(&self.port),
            None => {
                debug!(node = %self.port.node(), "No brake configured");
                Ok(())
            }
        }
    }

    /// Engage the brake. No-op without a configured brake.
    pub fn engage_brake(&mut self) -> AxisResult<()> {
        match self.brake.as_mut() {
            Some(brake) => brake.engage(&self.port),
            None => {
                debug!(node = %self.port.node(), "No brake configured");
                Ok(())
            }
        }
    }

    /// `None` when the axis has no brake.
    pub fn brake_state(&self) -> Option<BrakeState> {
        self.brake.as_ref().map(BrakeSequencer::state)
    }

    // ─── Monitoring ─────────────────────────────────────────────────

    /// Status word, position and velocity from the process image.
    pub fn get_status(&self) -> AxisResult<StatusSnapshot> {
        let status_word = self.port.read_status(Access::Pdo)?;
        let position = self.port.read(Register::PositionActual, Access::Pdo)?;
        let velocity = self.port.read(Register::VelocityActual, Access::Pdo)?;
        Ok(StatusSnapshot {
            status_word,
            state: status_word.state(),
            target_reached: status_word.target_reached(),
            position: self.factor.from_counts(position),
            velocity: self.factor.from_counts(velocity),
        })
    }

    /// Single read of the target-reached bit.
    pub fn check_target_reached(&self) -> AxisResult<bool> {
        Ok(self.port.read_status(Access::Pdo)?.target_reached())
    }

    /// Wait for target reached. `false` on timeout or fault; a fault is
    /// also logged at error level.
    pub fn wait_target_reached(&self, timeout: Duration, poll_interval: Duration) -> AxisResult<bool> {
        let outcome = self.wait_target(timeout, poll_interval)?;
        if let WaitOutcome::Faulted { status, .. } = outcome {
            error!(node = %self.node(), %status, "Wait aborted by drive fault");
        }
        Ok(outcome.reached())
    }

    /// Wait for target reached and report how the wait ended.
    pub fn wait_target(&self, timeout: Duration, poll_interval: Duration) -> AxisResult<WaitOutcome> {
        TargetMonitor::new(timeout, poll_interval)?.wait(&self.port)
    }

    // ─── Faults ─────────────────────────────────────────────────────

    /// Remove voltage and reset a latched fault.
    pub fn clear_fault(&mut self) -> AxisResult<()> {
        power::clear_fault(&self.port).map(|_| ())
    }

    pub fn quick_stop(&mut self) -> AxisResult<()> {
        power::quick_stop(&self.port)
    }

    /// Newest drive error code (0 = none).
    pub fn last_error_code(&self) -> AxisResult<u16> {
        Ok(self.port.read(Register::ErrorCode, Access::Sdo)? as u16)
    }

    // ─── Parameters ─────────────────────────────────────────────────

    /// Local conversion factor.
    pub fn units_factor(&self) -> UnitsFactor {
        self.factor
    }

    /// Write the conversion factor to the drive and use it locally.
    pub fn set_units_factor(&mut self, factor: UnitsFactor) -> AxisResult<()> {
        self.port
            .write(Register::UnitsFactor, factor.to_register(), Access::Sdo)?;
        self.factor = factor;
        debug!(node = %self.node(), %factor, "Units factor set");
        Ok(())
    }

    /// Conversion factor as stored in the drive.
    pub fn read_units_factor(&self) -> AxisResult<UnitsFactor> {
        let raw = self.port.read(Register::UnitsFactor, Access::Sdo)?;
        Ok(UnitsFactor::from_register(raw)?)
    }

    /// Profile velocity, acceleration and deceleration in user units.
    pub fn set_motion_profile(&mut self, profile: &MotionProfile) -> AxisResult<()> {
        profile.validate()?;
        let velocity = self.factor.to_counts(profile.velocity)?;
        let acceleration = self.factor.to_counts(profile.acceleration)?;
        let deceleration = self.factor.to_counts(profile.deceleration)?;
        self.port
            .write(Register::ProfileVelocity, velocity, Access::Sdo)?;
        self.port
            .write(Register::ProfileAcceleration, acceleration, Access::Sdo)?;
        self.port
            .write(Register::ProfileDeceleration, deceleration, Access::Sdo)?;
        info!(node = %self.node(), ?profile, "Motion profile set");
        Ok(())
    }

    /// Quick stop ramp in user units/s².
    pub fn set_quick_stop_deceleration(&mut self, deceleration: f64) -> AxisResult<()> {
        if !deceleration.is_finite() || deceleration <= 0.0 {
            return Err(ConfigError::invalid(format!(
                "quick stop deceleration must be finite and > 0, got {deceleration}"
            ))
            .into());
        }
        let counts = self.factor.to_counts(deceleration)?;
        self.port
            .write(Register::QuickStopDeceleration, counts, Access::Sdo)?;
        Ok(())
    }

    /// Software position limits in user units.
    pub fn set_position_limits(&mut self, min: f64, max: f64) -> AxisResult<()> {
        if min.is_nan() || max.is_nan() || min >= max {
            return Err(ConfigError::invalid(format!(
                "position limits need min < max, got {min}..{max}"
            ))
            .into());
        }
        let min_counts = self.factor.to_counts(min)?;
        let max_counts = self.factor.to_counts(max)?;
        self.port
            .write(Register::SoftwarePositionLimitMin, min_counts, Access::Sdo)?;
        self.port
            .write(Register::SoftwarePositionLimitMax, max_counts, Access::Sdo)?;
        Ok(())
    }

    /// Persist all drive parameters.
    pub fn save_parameters(&self, timeout: Duration) -> AxisResult<()> {
        self.port
            .link()
            .save_all_params(self.port.master(), self.node(), timeout)?;
        info!(node = %self.node(), "Parameters saved");
        Ok(())
    }

    // ─── Teardown ───────────────────────────────────────────────────

    /// Disable the axis and give the handle up.
    pub fn close(mut self) -> AxisResult<()> {
        self.disable()
    }
}
