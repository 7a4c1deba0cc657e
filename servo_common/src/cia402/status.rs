//! Statusword (0x6041) decoding.
//!
//! The priority table lives in [`StatusWord::state`] and nowhere else:
//!
//! | Priority | Condition                                             | State              |
//! |----------|-------------------------------------------------------|--------------------|
//! | 1        | fault                                                 | Fault              |
//! | 2        | !quick_stop && voltage_enabled && !switched_on && !op | QuickStopActive    |
//! | 3        | `raw & 0x4F == 0x40`                                  | SwitchOnDisabled   |
//! | 3        | `raw & 0x4F == 0x01`                                  | ReadyToSwitchOn    |
//! | 3        | `raw & 0x4F == 0x03`                                  | SwitchedOn         |
//! | 3        | `raw & 0x4F == 0x07`                                  | OperationEnabled   |
//! | 4        | anything else                                         | NotReadyToSwitchOn |

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Device statusword. Bits not named here are retained as read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusWord: u16 {
        /// 0 Ready to switch on.
        const READY_TO_SWITCH_ON    = 1 << 0;
        /// 1 Switched on.
        const SWITCHED_ON           = 1 << 1;
        /// 2 Operation enabled.
        const OPERATION_ENABLED     = 1 << 2;
        /// 3 Fault.
        const FAULT                 = 1 << 3;
        /// 4 Voltage enabled.
        const VOLTAGE_ENABLED       = 1 << 4;
        /// 5 Quick stop (active low).
        const QUICK_STOP            = 1 << 5;
        /// 6 Switch on disabled.
        const SWITCH_ON_DISABLED    = 1 << 6;
        /// 7 Warning.
        const WARNING               = 1 << 7;
        /// 9 Remote.
        const REMOTE                = 1 << 9;
        /// 10 Target reached.
        const TARGET_REACHED        = 1 << 10;
        /// 11 Internal limit active.
        const INTERNAL_LIMIT_ACTIVE = 1 << 11;
    }
}

/// Bits that select among the plain power states.
const STATE_MASK: u16 = 0x4F;

/// Mask and pattern of the enable confirmation check.
const POWER_ENABLED_MASK: u16 = 0x6F;
const POWER_ENABLED_PATTERN: u16 = 0x27;

impl StatusWord {
    /// Wrap a raw register value, keeping every bit.
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self::from_bits_retain(raw)
    }

    /// Raw register value.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.bits()
    }

    /// Derive the drive state. Never fails: every value maps to one state.
    pub const fn state(self) -> AxisState {
        let raw = self.bits();
        if self.contains(Self::FAULT) {
            return AxisState::Fault;
        }
        if !self.contains(Self::QUICK_STOP)
            && self.contains(Self::VOLTAGE_ENABLED)
            && !self.contains(Self::SWITCHED_ON)
            && !self.contains(Self::OPERATION_ENABLED)
        {
            return AxisState::QuickStopActive;
        }
        match raw & STATE_MASK {
            0x40 => AxisState::SwitchOnDisabled,
            0x01 => AxisState::ReadyToSwitchOn,
            0x03 => AxisState::SwitchedOn,
            0x07 => AxisState::OperationEnabled,
            _ => AxisState::NotReadyToSwitchOn,
        }
    }

    /// Target reached (bit 10), independent of the drive state.
    #[inline]
    pub const fn target_reached(self) -> bool {
        self.contains(Self::TARGET_REACHED)
    }

    /// Fault bit set.
    #[inline]
    pub const fn is_fault(self) -> bool {
        self.contains(Self::FAULT)
    }

    /// Enable confirmation: voltage, switched on and operation enabled with
    /// quick stop released (`raw & 0x6F == 0x27`).
    #[inline]
    pub const fn is_power_enabled(self) -> bool {
        self.bits() & POWER_ENABLED_MASK == POWER_ENABLED_PATTERN
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.bits())
    }
}

/// CiA-402 drive state derived from the statusword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AxisState {
    /// Drive electronics initializing.
    NotReadyToSwitchOn = 0,
    /// Power stage locked out until a shutdown command.
    SwitchOnDisabled = 1,
    /// Waiting for switch on.
    ReadyToSwitchOn = 2,
    /// Power stage on, operation not enabled.
    SwitchedOn = 3,
    /// Drive follows set-points.
    OperationEnabled = 4,
    /// Quick stop ramp executed, operation released.
    QuickStopActive = 5,
    /// Fault reaction in progress. The decoder reports this as `Fault`
    /// because the fault bit is already set.
    FaultReactionActive = 6,
    /// Latched fault, needs a fault reset.
    Fault = 7,
}

impl AxisState {
    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotReadyToSwitchOn => "not ready to switch on",
            Self::SwitchOnDisabled => "switch on disabled",
            Self::ReadyToSwitchOn => "ready to switch on",
            Self::SwitchedOn => "switched on",
            Self::OperationEnabled => "operation enabled",
            Self::QuickStopActive => "quick stop active",
            Self::FaultReactionActive => "fault reaction active",
            Self::Fault => "fault",
        }
    }
}

impl fmt::Display for AxisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of [`decode`]: the flags plus the derived state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedStatus {
    pub flags: StatusWord,
    pub state: AxisState,
}

/// Decode a raw statusword.
#[inline]
pub const fn decode(raw: u16) -> DecodedStatus {
    let flags = StatusWord::from_raw(raw);
    DecodedStatus {
        flags,
        state: flags.state(),
    }
}

/// Target-reached bit of a raw statusword.
#[inline]
pub const fn target_reached(raw: u16) -> bool {
    StatusWord::from_raw(raw).target_reached()
}

// ─── Tests ──────────────────────────────────────────────────────────
