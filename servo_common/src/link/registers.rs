//! Object dictionary entries addressed by the controller.
//!
//! Indices follow the CiA-402 drive profile; the unit factor lives in the
//! vendor area and is transferred as a REAL32 bit pattern.

use std::fmt;

/// Register (object dictionary entry) of a servo node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// 0x6040 Controlword.
    ControlWord,
    /// 0x6041 Statusword.
    StatusWord,
    /// 0x603F Error code of the newest alarm.
    ErrorCode,
    /// 0x6060 Modes of operation.
    ModesOfOperation,
    /// 0x6061 Modes of operation display.
    ModesOfOperationDisplay,
    /// 0x6064 Position actual value [counts].
    PositionActual,
    /// 0x606C Velocity actual value [counts/s].
    VelocityActual,
    /// 0x6071 Target torque [‰ of rated].
    TargetTorque,
    /// 0x607A Target position [counts].
    TargetPosition,
    /// 0x607D:01 Minimum software position limit [counts].
    SoftwarePositionLimitMin,
    /// 0x607D:02 Maximum software position limit [counts].
    SoftwarePositionLimitMax,
    /// 0x6081 Profile velocity [counts/s].
    ProfileVelocity,
    /// 0x6083 Profile acceleration [counts/s²].
    ProfileAcceleration,
    /// 0x6084 Profile deceleration [counts/s²].
    ProfileDeceleration,
    /// 0x6085 Quick stop deceleration [counts/s²].
    QuickStopDeceleration,
    /// 0x60FE:01 Physical digital outputs.
    DigitalOutputs,
    /// 0x60FF Target velocity [counts/s].
    TargetVelocity,
    /// 0x2010 Vendor unit factor (REAL32, device units per user unit).
    UnitsFactor,
}

impl Register {
    /// Object dictionary index.
    pub const fn index(self) -> u16 {
        match self {
            Self::ControlWord => 0x6040,
            Self::StatusWord => 0x6041,
            Self::ErrorCode => 0x603F,
            Self::ModesOfOperation => 0x6060,
            Self::ModesOfOperationDisplay => 0x6061,
            Self::PositionActual => 0x6064,
            Self::VelocityActual => 0x606C,
            Self::TargetTorque => 0x6071,
            Self::TargetPosition => 0x607A,
            Self::SoftwarePositionLimitMin | Self::SoftwarePositionLimitMax => 0x607D,
            Self::ProfileVelocity => 0x6081,
            Self::ProfileAcceleration => 0x6083,
            Self::ProfileDeceleration => 0x6084,
            Self::QuickStopDeceleration => 0x6085,
            Self::DigitalOutputs => 0x60FE,
            Self::TargetVelocity => 0x60FF,
            Self::UnitsFactor => 0x2010,
        }
    }

    /// Object dictionary sub-index.
    pub const fn sub_index(self) -> u8 {
        match self {
            Self::SoftwarePositionLimitMin | Self::DigitalOutputs => 1,
            Self::SoftwarePositionLimitMax => 2,
            _ => 0,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}h:{:02X}", self.index(), self.sub_index())
    }
}
