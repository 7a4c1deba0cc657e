//! Modes of operation (0x6060 / 0x6061).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Drive work mode with its fixed device code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum WorkMode {
    /// PP.
    ProfilePosition = 1,
    /// VM.
    Velocity = 2,
    /// PV.
    ProfileVelocity = 3,
    /// PT.
    ProfileTorque = 4,
    /// HM.
    Homing = 6,
    /// IP.
    Interpolated = 7,
    /// CSP.
    CyclicSyncPosition = 8,
    /// CSV.
    CyclicSyncVelocity = 9,
    /// CST.
    CyclicSyncTorque = 10,
}

impl WorkMode {
    /// Every mode, in code order.
    pub const ALL: [Self; 9] = [
        Self::ProfilePosition,
        Self::Velocity,
        Self::ProfileVelocity,
        Self::ProfileTorque,
        Self::Homing,
        Self::Interpolated,
        Self::CyclicSyncPosition,
        Self::CyclicSyncVelocity,
        Self::CyclicSyncTorque,
    ];

    /// Device code written to 0x6060.
    #[inline]
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// Map a value read from 0x6061. Returns `None` for codes outside the set.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::ProfilePosition),
            2 => Some(Self::Velocity),
            3 => Some(Self::ProfileVelocity),
            4 => Some(Self::ProfileTorque),
            6 => Some(Self::Homing),
            7 => Some(Self::Interpolated),
            8 => Some(Self::CyclicSyncPosition),
            9 => Some(Self::CyclicSyncVelocity),
            10 => Some(Self::CyclicSyncTorque),
            _ => None,
        }
    }

    /// Conventional abbreviation.
    pub const fn abbrev(self) -> &'static str {
        match self {
            Self::ProfilePosition => "PP",
            Self::Velocity => "VM",
            Self::ProfileVelocity => "PV",
            Self::ProfileTorque => "PT",
            Self::Homing => "HM",
            Self::Interpolated => "IP",
            Self::CyclicSyncPosition => "CSP",
            Self::CyclicSyncVelocity => "CSV",
            Self::CyclicSyncTorque => "CST",
        }
    }
}

impl fmt::Display for WorkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.abbrev(), self.code())
    }
}
