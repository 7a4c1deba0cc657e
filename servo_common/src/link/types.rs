//! Device Link value types.
//!
//! This module defines the data exchanged with the fieldbus transport:
//! - `TransportKind` / `BaudRate` - Transport selection
//! - `ConnectionDescriptor` - Structured connection configuration
//! - `MasterHandle` / `MasterState` - Master identity and NMT state
//! - `NodeId` - Validated node address
//! - `Access` - SDO (on demand) or PDO (cyclic image) register access

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::consts::{
    DEFAULT_DEVICE_TYPE, DEFAULT_PDO_INTERVAL_MS, DEFAULT_SYNC_INTERVAL_MS, NODE_ID_MAX,
    NODE_ID_MIN,
};

// ─── Transport ──────────────────────────────────────────────────────

/// Fieldbus family the master is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TransportKind {
    /// CANopen over a CAN adapter.
    #[default]
    CanOpen = 0,
    /// EtherCAT (CoE).
    EtherCat = 1,
    /// Modbus.
    Modbus = 2,
}

impl TransportKind {
    /// SDK communication-type code.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CanOpen => "CANopen",
            Self::EtherCat => "EtherCAT",
            Self::Modbus => "Modbus",
        };
        f.write_str(name)
    }
}

/// CAN bit rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum BaudRate {
    #[serde(rename = "10K")]
    K10 = 0,
    #[serde(rename = "20K")]
    K20 = 1,
    #[serde(rename = "50K")]
    K50 = 2,
    #[serde(rename = "100K")]
    K100 = 3,
    #[serde(rename = "125K")]
    K125 = 4,
    #[serde(rename = "250K")]
    K250 = 5,
    #[serde(rename = "500K")]
    K500 = 6,
    #[serde(rename = "800K")]
    K800 = 7,
    #[serde(rename = "1000K")]
    #[default]
    K1000 = 8,
}

impl BaudRate {
    /// SDK bit-rate code (0 = 10K ... 8 = 1000K).
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Bit rate in kbit/s.
    pub const fn kbps(self) -> u32 {
        match self {
            Self::K10 => 10,
            Self::K20 => 20,
            Self::K50 => 50,
            Self::K100 => 100,
            Self::K125 => 125,
            Self::K250 => 250,
            Self::K500 => 500,
            Self::K800 => 800,
            Self::K1000 => 1000,
        }
    }
}

// ─── Connection Descriptor ──────────────────────────────────────────

/// Transport-specific connection configuration.
///
/// # TOML Example
///
/// ```toml
/// [link.connection]
/// device_type = "1001"
/// device_index = 0
/// baud_rate = "1000K"
/// pdo_interval_ms = 10
/// sync_interval_ms = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionDescriptor {
    /// Adapter type identifier understood by the transport.
    pub device_type: String,
    /// Adapter index when several are plugged in.
    #[serde(default)]
    pub device_index: u32,
    /// Bus bit rate.
    #[serde(default)]
    pub baud_rate: BaudRate,
    /// Cyclic process-data interval.
    #[serde(default = "default_pdo_interval")]
    pub pdo_interval_ms: u32,
    /// SYNC producer interval.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_ms: u32,
}

fn default_pdo_interval() -> u32 {
    DEFAULT_PDO_INTERVAL_MS
}

fn default_sync_interval() -> u32 {
    DEFAULT_SYNC_INTERVAL_MS
}

impl Default for ConnectionDescriptor {
    fn default() -> Self {
        Self {
            device_type: DEFAULT_DEVICE_TYPE.to_string(),
            device_index: 0,
            baud_rate: BaudRate::default(),
            pdo_interval_ms: DEFAULT_PDO_INTERVAL_MS,
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
        }
    }
}

/// Wire layout of the vendor's JSON connection string.
#[derive(Serialize)]
struct ConnectionString<'a> {
    #[serde(rename = "DevType")]
    dev_type: &'a str,
    #[serde(rename = "DevIndex")]
    dev_index: u32,
    #[serde(rename = "Baudrate")]
    baudrate: u8,
    #[serde(rename = "PDOIntervalMS")]
    pdo_interval_ms: u32,
    #[serde(rename = "SyncIntervalMS")]
    sync_interval_ms: u32,
}

impl ConnectionDescriptor {
    /// Validate the descriptor.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the device type is empty or
    /// either interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_type.trim().is_empty() {
            return Err(ConfigError::invalid("connection.device_type cannot be empty"));
        }
        if self.pdo_interval_ms == 0 {
            return Err(ConfigError::invalid("connection.pdo_interval_ms must be > 0"));
        }
        if self.sync_interval_ms == 0 {
            return Err(ConfigError::invalid("connection.sync_interval_ms must be > 0"));
        }
        Ok(())
    }

    /// Render the JSON connection string the vendor master expects.
    pub fn to_connection_string(&self) -> Result<String, ConfigError> {
        let wire = ConnectionString {
            dev_type: &self.device_type,
            dev_index: self.device_index,
            baudrate: self.baud_rate.code(),
            pdo_interval_ms: self.pdo_interval_ms,
            sync_interval_ms: self.sync_interval_ms,
        };
        serde_json::to_string(&wire).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// ─── Master ─────────────────────────────────────────────────────────

/// Opaque handle of a master created by the Device Link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MasterHandle(u32);

impl MasterHandle {
    /// Wrap a raw handle issued by a transport.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MasterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "master#{}", self.0)
    }
}

/// Network management state requested from the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MasterState {
    /// SDO access only; process data is not exchanged.
    PreOperational,
    /// Cyclic process data running.
    Operational,
}

// ─── Node Address ───────────────────────────────────────────────────

/// Fieldbus node address, always within `1..=127`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct NodeId(u8);

impl NodeId {
    /// Validate and wrap a node address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` outside `1..=127`.
    pub fn new(raw: u8) -> Result<Self, ConfigError> {
        if (NODE_ID_MIN..=NODE_ID_MAX).contains(&raw) {
            Ok(Self(raw))
        } else {
            Err(ConfigError::invalid(format!(
                "node address {raw} outside {NODE_ID_MIN}..={NODE_ID_MAX}"
            )))
        }
    }

    /// Compile-time constructor for known-good addresses.
    ///
    /// # Panics
    ///
    /// Panics (at compile time in const context) outside `1..=127`.
    pub const fn new_const(raw: u8) -> Self {
        assert!(raw >= NODE_ID_MIN && raw <= NODE_ID_MAX, "node address outside 1..=127");
        Self(raw)
    }

    /// Raw address.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for NodeId {
    type Error = ConfigError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<NodeId> for u8 {
    fn from(node: NodeId) -> Self {
        node.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Register Access ────────────────────────────────────────────────

/// Path used for a register read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Service data object: confirmed, on-demand transfer.
    Sdo,
    /// Process data object: value from/into the cyclic image.
    Pdo,
}

impl Access {
    /// The SDK's `bSDO` flag.
    #[inline]
    pub const fn is_sdo(self) -> bool {
        matches!(self, Self::Sdo)
    }
}
