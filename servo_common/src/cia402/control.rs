//! Controlword (0x6040) encoding.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Device controlword.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ControlWord: u16 {
        /// 0 Switch on.
        const SWITCH_ON              = 1 << 0;
        /// 1 Enable voltage.
        const ENABLE_VOLTAGE         = 1 << 1;
        /// 2 Quick stop (active low).
        const QUICK_STOP             = 1 << 2;
        /// 3 Enable operation.
        const ENABLE_OPERATION       = 1 << 3;
        /// 4 New set-point (profile position, rising edge).
        const NEW_SET_POINT          = 1 << 4;
        /// 5 Change set immediately (profile position).
        const CHANGE_SET_IMMEDIATELY = 1 << 5;
        /// 6 Target is relative (profile position).
        const RELATIVE               = 1 << 6;
        /// 7 Fault reset (rising edge).
        const FAULT_RESET            = 1 << 7;
        /// 8 Halt.
        const HALT                   = 1 << 8;
    }
}

impl ControlWord {
    /// Enable-operation command (0x0F): the base of every motion word.
    pub const OPERATION: Self = Self::from_bits_retain(0x000F);

    /// Motion word for a profile-position set-point, before the
    /// new-set-point edge is raised.
    pub const fn set_point(immediate: bool, relative: bool) -> Self {
        let mut bits = Self::OPERATION.bits();
        if immediate {
            bits |= Self::CHANGE_SET_IMMEDIATELY.bits();
        }
        if relative {
            bits |= Self::RELATIVE.bits();
        }
        Self::from_bits_retain(bits)
    }

    /// Same word with the new-set-point edge raised.
    #[inline]
    pub const fn with_new_set_point(self) -> Self {
        self.union(Self::NEW_SET_POINT)
    }

    /// Raw register value.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.bits()
    }
}

impl fmt::Display for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.bits())
    }
}

/// Requested power-stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerRequest {
    /// Shutdown: drop switched-on and enable-operation, keep voltage.
    PowerOff,
    /// Switch on the power stage without enabling operation.
    SwitchOn,
    /// Switch on and enable operation.
    PowerOn,
    /// Remove voltage: drive returns to switch-on disabled.
    DisableVoltage,
    /// Quick stop ramp.
    QuickStop,
    /// Fault reset edge.
    FaultReset,
}

/// Canonical controlword for a power request.
pub const fn encode(request: PowerRequest) -> ControlWord {
    let raw = match request {
        PowerRequest::PowerOff => 0x0006,
        PowerRequest::SwitchOn => 0x0007,
        PowerRequest::PowerOn => 0x002F,
        PowerRequest::DisableVoltage => 0x0000,
        PowerRequest::QuickStop => 0x0002,
        PowerRequest::FaultReset => 0x0080,
    };
    ControlWord::from_bits_retain(raw)
}
