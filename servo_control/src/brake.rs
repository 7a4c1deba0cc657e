//! Holding brake sequencing.
//!
//! The brake hangs off one bit of the drive's digital output register. The
//! caller brackets power transitions with it: release after enable and
//! before any moving command, engage before power is removed downstream.

use std::fmt;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use servo_common::config::ConfigError;
use servo_common::link::{Access, DeviceLink, Register};
use tracing::info;

use crate::config::{BrakeConfig, OutputLevel};
use crate::error::AxisResult;
use crate::port::NodePort;

/// Mechanical brake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrakeState {
    Released,
    Engaged,
}

impl fmt::Display for BrakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Released => "released",
            Self::Engaged => "engaged",
        })
    }
}

/// Drives the brake output and remembers the last commanded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrakeSequencer {
    config: BrakeConfig,
    settle: Duration,
    state: BrakeState,
}

impl BrakeSequencer {
    /// Sequencer for a brake assumed engaged (power-up state).
    ///
    /// # Errors
    ///
    /// `ValidationError` if the output bit does not fit the register.
    pub fn new(config: BrakeConfig, settle: Duration) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            settle,
            state: BrakeState::Engaged,
        })
    }

    pub fn state(&self) -> BrakeState {
        self.state
    }

    pub fn config(&self) -> &BrakeConfig {
        &self.config
    }

    /// Digital output register value for `state`.
    pub fn output_value(&self, state: BrakeState) -> i32 {
        let bit = 1i32 << self.config.output_bit;
        match (state, self.config.release_level) {
            (BrakeState::Released, OutputLevel::High) | (BrakeState::Engaged, OutputLevel::Low) => {
                bit
            }
            _ => 0,
        }
    }

    /// Set the release level and wait for the brake to lift.
    pub fn release<L: DeviceLink>(&mut self, port: &NodePort<'_, L>) -> AxisResult<()> {
        self.apply(port, BrakeState::Released)
    }

    /// Set the engage level and wait for the brake to close.
    pub fn engage<L: DeviceLink>(&mut self, port: &NodePort<'_, L>) -> AxisResult<()> {
        self.apply(port, BrakeState::Engaged)
    }

    fn apply<L: DeviceLink>(&mut self, port: &NodePort<'_, L>, state: BrakeState) -> AxisResult<()> {
        port.write(Register::DigitalOutputs, self.output_value(state), Access::Sdo)?;
        thread::sleep(self.settle);
        self.state = state;
        info!(node = %port.node(), brake = %state, "Brake {state}");
        Ok(())
    }
}
