//! Conversion between user units (mm, mm/s) and device units (counts, counts/s).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Device units per user unit. Always finite and strictly positive.
///
/// The drive stores the factor as REAL32, so the wrapped value is the
/// f32-rounded one and matches what the device reports back.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct UnitsFactor(f64);

impl UnitsFactor {
    /// Validate and wrap a conversion factor.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for zero, negative, NaN or
    /// infinite factors, and for factors outside the REAL32 range.
    pub fn new(factor: f64) -> Result<Self, ConfigError> {
        let real32 = factor as f32;
        if factor.is_finite() && factor > 0.0 && real32.is_finite() && real32 > 0.0 {
            Ok(Self(f64::from(real32)))
        } else {
            Err(ConfigError::invalid(format!(
                "units factor must be finite and > 0, got {factor}"
            )))
        }
    }

    /// Compile-time constructor for known-good factors.
    ///
    /// # Panics
    ///
    /// Panics (at compile time in const context) unless finite and > 0 as
    /// a REAL32.
    pub const fn new_const(factor: f64) -> Self {
        let real32 = factor as f32;
        assert!(
            factor.is_finite() && factor > 0.0 && real32.is_finite() && real32 > 0.0,
            "units factor must be finite and > 0"
        );
        Self(real32 as f64)
    }

    /// Raw factor.
    #[inline]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// `user * factor`.
    #[inline]
    pub fn to_device(self, user: f64) -> f64 {
        to_device(user, self.0)
    }

    /// `device / factor`.
    #[inline]
    pub fn to_user(self, device: f64) -> f64 {
        to_user(device, self.0)
    }

    /// Convert a user value to whole device counts, rounding to nearest.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `user` is not finite or the
    /// result does not fit a 32-bit register.
    pub fn to_counts(self, user: f64) -> Result<i32, ConfigError> {
        if !user.is_finite() {
            return Err(ConfigError::invalid(format!("value {user} is not finite")));
        }
        let device = self.to_device(user).round();
        if device < f64::from(i32::MIN) || device > f64::from(i32::MAX) {
            return Err(ConfigError::invalid(format!(
                "{user} user units ({device} counts) exceed the register range"
            )));
        }
        Ok(device as i32)
    }

    /// Convert device counts read from a register to user units.
    #[inline]
    pub fn from_counts(self, counts: i32) -> f64 {
        self.to_user(f64::from(counts))
    }

    /// REAL32 bit pattern as transferred in the vendor unit-factor object.
    #[inline]
    pub fn to_register(self) -> i32 {
        (self.0 as f32).to_bits() as i32
    }

    /// Decode a REAL32 bit pattern read from the device.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the device holds an
    /// unusable factor.
    pub fn from_register(raw: i32) -> Result<Self, ConfigError> {
        Self::new(f64::from(f32::from_bits(raw as u32)))
    }
}

impl TryFrom<f64> for UnitsFactor {
    type Error = ConfigError;

    fn try_from(factor: f64) -> Result<Self, Self::Error> {
        Self::new(factor)
    }
}

impl From<UnitsFactor> for f64 {
    fn from(factor: UnitsFactor) -> Self {
        factor.0
    }
}

impl fmt::Display for UnitsFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `user_value * factor`.
#[inline]
pub fn to_device(user_value: f64, factor: f64) -> f64 {
    user_value * factor
}

/// `device_value / factor`.
#[inline]
pub fn to_user(device_value: f64, factor: f64) -> f64 {
    device_value / factor
}
