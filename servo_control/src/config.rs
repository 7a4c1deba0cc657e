//! Controller configuration.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "info"
//! service_name = "servo-axis"
//!
//! [link]
//! transport = "canopen"
//!
//! [link.connection]
//! device_type = "1001"
//! baud_rate = "1000K"
//!
//! [link.scan]
//! from = 1
//! to = 10
//!
//! [axis]
//! node_id = 1
//! units_factor = 10000.0
//! parameter_db = "CANopen.db"
//!
//! [axis.brake]
//! output_bit = 0
//! release_level = "high"
//!
//! [axis.profile]
//! velocity = 50.0
//! acceleration = 500.0
//! deceleration = 500.0
//!
//! [axis.timing]
//! power_on_ms = 200
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use servo_common::config::{ConfigError, ConfigLoader, SharedConfig};
use servo_common::consts::{
    BRAKE_SETTLE, DEFAULT_PARAMETER_DB, DEFAULT_SCAN_FROM, DEFAULT_SCAN_TO,
    DEFAULT_UNITS_FACTOR, MASTER_STATE_SETTLE, MODE_SWITCH_SETTLE, POWER_OFF_SETTLE,
    POWER_ON_SETTLE,
};
use servo_common::link::{ConnectionDescriptor, NodeId, TransportKind};
use servo_common::units::UnitsFactor;

// ─── Top Level ──────────────────────────────────────────────────────

/// Complete controller configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub link: LinkConfig,
    pub axis: AxisConfig,
}

impl ControllerConfig {
    /// Load from a TOML file and validate.
    ///
    /// # Errors
    ///
    /// `FileNotFound`/`ParseError` from loading, `ValidationError` from
    /// [`ControllerConfig::validate`].
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section and their cross-references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.link.validate()?;
        self.axis.validate()?;
        if !self.link.scan.contains(self.axis.node_id) {
            return Err(ConfigError::invalid(format!(
                "axis.node_id {} outside scan range {}",
                self.axis.node_id, self.link.scan
            )));
        }
        Ok(())
    }
}

// ─── Link ───────────────────────────────────────────────────────────

/// Fieldbus master settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    #[serde(default)]
    pub transport: TransportKind,
    #[serde(default)]
    pub connection: ConnectionDescriptor,
    #[serde(default)]
    pub scan: ScanRange,
}

impl LinkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.connection.validate()?;
        self.scan.validate()
    }
}

/// Inclusive node address range scanned during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanRange {
    pub from: NodeId,
    pub to: NodeId,
}

impl Default for ScanRange {
    fn default() -> Self {
        Self {
            from: NodeId::new_const(DEFAULT_SCAN_FROM),
            to: NodeId::new_const(DEFAULT_SCAN_TO),
        }
    }
}

impl ScanRange {
    /// Range `from..=to`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `from > to`.
    pub fn new(from: NodeId, to: NodeId) -> Result<Self, ConfigError> {
        let range = Self { from, to };
        range.validate()?;
        Ok(range)
    }

    /// Range covering exactly one node.
    pub fn single(node: NodeId) -> Self {
        Self { from: node, to: node }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.from > self.to {
            return Err(ConfigError::invalid(format!("scan range {self} is empty")));
        }
        Ok(())
    }

    pub fn contains(&self, node: NodeId) -> bool {
        (self.from..=self.to).contains(&node)
    }
}

impl std::fmt::Display for ScanRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}

// ─── Axis ───────────────────────────────────────────────────────────

/// Per-axis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    pub node_id: NodeId,
    /// Device units per user unit.
    #[serde(default = "default_units_factor")]
    pub units_factor: UnitsFactor,
    /// Parameter database loaded into the node.
    #[serde(default = "default_parameter_db")]
    pub parameter_db: String,
    /// Holding brake; absent when the axis has none.
    #[serde(default)]
    pub brake: Option<BrakeConfig>,
    #[serde(default)]
    pub profile: Option<MotionProfile>,
    #[serde(default)]
    pub timing: SettleTimes,
}

fn default_units_factor() -> UnitsFactor {
    UnitsFactor::new_const(DEFAULT_UNITS_FACTOR)
}

fn default_parameter_db() -> String {
    DEFAULT_PARAMETER_DB.to_string()
}

impl AxisConfig {
    /// Axis with vendor defaults and no brake.
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            units_factor: default_units_factor(),
            parameter_db: default_parameter_db(),
            brake: None,
            profile: None,
            timing: SettleTimes::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parameter_db.trim().is_empty() {
            return Err(ConfigError::invalid("axis.parameter_db cannot be empty"));
        }
        if let Some(brake) = &self.brake {
            brake.validate()?;
        }
        if let Some(profile) = &self.profile {
            profile.validate()?;
        }
        Ok(())
    }
}

/// Electrical level of a digital output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputLevel {
    #[default]
    High,
    Low,
}

/// Holding brake wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct BrakeConfig {
    /// Bit of the digital output register driving the brake.
    #[serde(default)]
    pub output_bit: u8,
    /// Output level that releases the brake.
    #[serde(default)]
    pub release_level: OutputLevel,
}

impl BrakeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_bit >= 32 {
            return Err(ConfigError::invalid(format!(
                "axis.brake.output_bit {} must be < 32",
                self.output_bit
            )));
        }
        Ok(())
    }
}

/// Profile velocity, acceleration and deceleration in user units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotionProfile {
    pub velocity: f64,
    pub acceleration: f64,
    pub deceleration: f64,
}

impl MotionProfile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("velocity", self.velocity),
            ("acceleration", self.acceleration),
            ("deceleration", self.deceleration),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(format!(
                    "axis.profile.{name} must be finite and > 0, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Settle delays around power, mode, brake and master transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettleTimes {
    pub power_on_ms: u64,
    pub power_off_ms: u64,
    pub mode_switch_ms: u64,
    pub brake_ms: u64,
    pub master_state_ms: u64,
}

impl Default for SettleTimes {
    fn default() -> Self {
        Self {
            power_on_ms: POWER_ON_SETTLE.as_millis() as u64,
            power_off_ms: POWER_OFF_SETTLE.as_millis() as u64,
            mode_switch_ms: MODE_SWITCH_SETTLE.as_millis() as u64,
            brake_ms: BRAKE_SETTLE.as_millis() as u64,
            master_state_ms: MASTER_STATE_SETTLE.as_millis() as u64,
        }
    }
}

impl SettleTimes {
    /// No settling at all (simulation).
    pub const ZERO: Self = Self {
        power_on_ms: 0,
        power_off_ms: 0,
        mode_switch_ms: 0,
        brake_ms: 0,
        master_state_ms: 0,
    };

    pub fn power_on(&self) -> Duration {
        Duration::from_millis(self.power_on_ms)
    }

    pub fn power_off(&self) -> Duration {
        Duration::from_millis(self.power_off_ms)
    }

    pub fn mode_switch(&self) -> Duration {
        Duration::from_millis(self.mode_switch_ms)
    }

    pub fn brake(&self) -> Duration {
        Duration::from_millis(self.brake_ms)
    }

    pub fn master_state(&self) -> Duration {
        Duration::from_millis(self.master_state_ms)
    }
}
