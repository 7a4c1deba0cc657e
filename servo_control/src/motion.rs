//! Motion command dispatch.
//!
//! Commands are converted to device units first, then the drive state and
//! active mode are checked, and only then are set-points written. Writes go
//! out over PDO and are not confirmed here; completion is observed through
//! the target monitor.

use std::fmt;

use servo_common::cia402::{AxisState, ControlWord, WorkMode};
use servo_common::link::{Access, DeviceLink, Register};
use servo_common::units::UnitsFactor;
use tracing::{debug, warn};

use crate::error::{AxisError, AxisResult};
use crate::port::NodePort;

/// Motion request in user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCommand {
    /// Move to `position`. `immediate` replaces a running segment instead of
    /// queueing behind it.
    AbsoluteMove { position: f64, immediate: bool },
    /// Move by `distance` from the last target.
    RelativeMove { distance: f64, immediate: bool },
    /// Run at a constant signed velocity; zero stops.
    VelocityRun { signed_velocity: f64 },
}

impl MotionCommand {
    /// Work mode the command is valid in.
    pub const fn required_mode(&self) -> WorkMode {
        match self {
            Self::AbsoluteMove { .. } | Self::RelativeMove { .. } => WorkMode::ProfilePosition,
            Self::VelocityRun { .. } => WorkMode::ProfileVelocity,
        }
    }

    /// Whether issuing the command can move the axis.
    pub fn moves_axis(&self) -> bool {
        match *self {
            Self::AbsoluteMove { .. } => true,
            Self::RelativeMove { distance, .. } => distance != 0.0,
            Self::VelocityRun { signed_velocity } => signed_velocity != 0.0,
        }
    }

    fn to_device(self, factor: UnitsFactor) -> AxisResult<DeviceCommand> {
        Ok(match self {
            Self::AbsoluteMove {
                position,
                immediate,
            } => DeviceCommand::SetPoint {
                counts: factor.to_counts(position)?,
                word: ControlWord::set_point(immediate, false),
            },
            Self::RelativeMove {
                distance,
                immediate,
            } => DeviceCommand::SetPoint {
                counts: factor.to_counts(distance)?,
                word: ControlWord::set_point(immediate, true),
            },
            Self::VelocityRun { signed_velocity } => {
                let (direction, magnitude) = Direction::split(signed_velocity);
                let counts = factor.to_counts(magnitude)?;
                DeviceCommand::Velocity {
                    counts: direction.apply(counts),
                    direction,
                }
            }
        })
    }
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbsoluteMove {
                position,
                immediate,
            } => write!(f, "absolute {position} (immediate: {immediate})"),
            Self::RelativeMove {
                distance,
                immediate,
            } => write!(f, "relative {distance} (immediate: {immediate})"),
            Self::VelocityRun { signed_velocity } => write!(f, "velocity {signed_velocity}"),
        }
    }
}

/// Travel direction of a velocity run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Direction and magnitude of a signed velocity. Zero (of either sign)
    /// is a forward run at zero speed.
    pub fn split(signed: f64) -> (Self, f64) {
        if signed < 0.0 {
            (Self::Backward, -signed)
        } else {
            (Self::Forward, signed.abs())
        }
    }

    fn apply(self, magnitude: i32) -> i32 {
        match self {
            Self::Forward => magnitude,
            Self::Backward => -magnitude,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DeviceCommand {
    SetPoint { counts: i32, word: ControlWord },
    Velocity { counts: i32, direction: Direction },
}

/// Validate preconditions and issue `command` to the drive.
///
/// # Errors
///
/// - `Configuration` if a value is not finite or overflows the register
/// - `Fault` if the drive reports a fault
/// - `NotEnabled` if operation is not enabled
/// - `ModeMismatch` if the active mode does not fit the command
///
/// None of these write to the device.
pub fn dispatch<L: DeviceLink>(
    port: &NodePort<'_, L>,
    factor: UnitsFactor,
    command: MotionCommand,
) -> AxisResult<()> {
    let device = command.to_device(factor)?;

    let status = port.read_status(Access::Pdo)?;
    match status.state() {
        AxisState::OperationEnabled => {}
        AxisState::Fault => return Err(AxisError::Fault { status }),
        state => {
            warn!(node = %port.node(), %command, %state, "Motion rejected: axis not enabled");
            return Err(AxisError::NotEnabled { state });
        }
    }

    let expected = command.required_mode();
    let observed = port.read(Register::ModesOfOperationDisplay, Access::Pdo)?;
    if observed != i32::from(expected.code()) {
        warn!(node = %port.node(), %command, %expected, observed, "Motion rejected: wrong mode");
        return Err(AxisError::ModeMismatch { expected, observed });
    }

    match device {
        DeviceCommand::SetPoint { counts, word } => {
            port.write(Register::TargetPosition, counts, Access::Pdo)?;
            port.write_control(word, Access::Pdo)?;
            port.write_control(word.with_new_set_point(), Access::Pdo)?;
            debug!(node = %port.node(), counts, control_word = %word, "Set-point issued");
        }
        DeviceCommand::Velocity { counts, direction } => {
            port.write(Register::TargetVelocity, counts, Access::Pdo)?;
            port.write_control(ControlWord::OPERATION, Access::Pdo)?;
            debug!(node = %port.node(), counts, ?direction, "Velocity issued");
        }
    }
    Ok(())
}
