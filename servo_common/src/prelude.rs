//! Prelude module for common re-exports.
//!
//! Consumers can `use servo_common::prelude::*;` and get the codec, the
//! Device Link interface and configuration types without listing paths.

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── Device Link ────────────────────────────────────────────────────
pub use crate::link::{
    Access, BaudRate, ConnectionDescriptor, DeviceLink, LinkError, MasterHandle, MasterState,
    NodeId, Register, TransportKind,
};

// ─── CiA-402 ────────────────────────────────────────────────────────
pub use crate::cia402::{AxisState, ControlWord, PowerRequest, StatusWord, WorkMode};

// ─── Units ──────────────────────────────────────────────────────────
pub use crate::units::UnitsFactor;
