//! Device Link trait and error types.
//!
//! This module defines:
//! - `DeviceLink` trait - Interface of the fieldbus transport consumed by the controller
//! - `LinkError` enum - Failure codes reported by the transport

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::registers::Register;
use super::types::{Access, ConnectionDescriptor, MasterHandle, MasterState, NodeId, TransportKind};

/// Error types for Device Link operations.
///
/// One variant per failure code of the vendor servo SDK; [`LinkError::code`]
/// returns that numeric code for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The transport library was not initialized.
    #[error("Transport not initialized")]
    NotInitialized,

    /// No master implementation for the requested transport.
    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(TransportKind),

    /// Malformed argument (usually the connection string).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Master creation failed.
    #[error("Failed to create master: {0}")]
    CreateMasterFailed(String),

    /// The handle does not name a live master.
    #[error("Master does not exist")]
    MasterNotExist,

    /// Master could not be started on the adapter.
    #[error("Failed to start master: {0}")]
    MasterStartFailed(String),

    /// Master exists but is not running.
    #[error("Master is not running")]
    MasterNotRunning,

    /// Node did not answer the scan.
    #[error("Node {0} is not online")]
    NodeNotOnline(NodeId),

    /// Parameter database could not be loaded.
    #[error("Failed to load parameter set: {0}")]
    LoadParameterSetFailed(String),

    /// Object dictionary entry unknown to the node.
    #[error("Parameter {0} does not exist")]
    ParameterNotExist(Register),

    /// SDO upload failed.
    #[error("SDO read of {0} failed")]
    SdoReadFailed(Register),

    /// SDO download failed.
    #[error("SDO write of {0} failed")]
    SdoWriteFailed(Register),

    /// The node refused the operation in its current state.
    #[error("Operation not allowed: {0}")]
    OperationNotAllowed(String),

    /// Master-side failure (e.g. NMT transition refused).
    #[error("Master internal error: {0}")]
    MasterInternal(String),

    /// Parameter save did not complete.
    #[error("Failed to save parameters: {0}")]
    SaveParamsFailed(String),

    /// No adapter found for the descriptor.
    #[error("No available device")]
    NoAvailableDevice,
}

impl LinkError {
    /// Numeric failure code as reported by the vendor SDK.
    pub const fn code(&self) -> u8 {
        match self {
            Self::NotInitialized => 2,
            Self::UnsupportedTransport(_) => 3,
            Self::InvalidParameter(_) => 4,
            Self::CreateMasterFailed(_) => 5,
            Self::MasterNotExist => 6,
            Self::MasterStartFailed(_) => 7,
            Self::MasterNotRunning => 8,
            Self::NodeNotOnline(_) => 9,
            Self::LoadParameterSetFailed(_) => 10,
            Self::ParameterNotExist(_) => 11,
            Self::SdoReadFailed(_) => 12,
            Self::SdoWriteFailed(_) => 13,
            Self::OperationNotAllowed(_) => 14,
            Self::MasterInternal(_) => 15,
            Self::SaveParamsFailed(_) => 28,
            Self::NoAvailableDevice => 29,
        }
    }
}

/// Trait defining the fieldbus transport consumed by the controller.
///
/// Implementations own their synchronization, so every method takes `&self`
/// and one master can be shared by axis handles addressing different nodes.
///
/// # Lifecycle
///
/// 1. `create_master()` → `connect()`
/// 2. `set_master_state(PreOperational)` → `scan_nodes()` → per-node setup
/// 3. `set_master_state(Operational)` → register traffic
/// 4. `set_master_state(PreOperational)` → `stop_master()` → `destroy_master()`
///
/// Every call blocks until the transport answers.
pub trait DeviceLink: Send + Sync {
    /// Returns the transport's identifier (e.g., "simulation", "canopen").
    fn name(&self) -> &'static str;

    /// Create a master for the given transport kind.
    fn create_master(&self, transport: TransportKind) -> Result<MasterHandle, LinkError>;

    /// Destroy a stopped master and release its handle.
    fn destroy_master(&self, master: MasterHandle) -> Result<(), LinkError>;

    /// Open the adapter described by `descriptor` and start the master.
    fn connect(
        &self,
        master: MasterHandle,
        descriptor: &ConnectionDescriptor,
    ) -> Result<(), LinkError>;

    /// Stop the master (cyclic exchange halts, adapter closed).
    fn stop_master(&self, master: MasterHandle) -> Result<(), LinkError>;

    /// Request a network management state for all nodes.
    fn set_master_state(&self, master: MasterHandle, state: MasterState) -> Result<(), LinkError>;

    /// Probe node addresses `from..=to`.
    fn scan_nodes(&self, master: MasterHandle, from: NodeId, to: NodeId) -> Result<(), LinkError>;

    /// Whether `node` answered the last scan.
    fn is_online(&self, master: MasterHandle, node: NodeId) -> bool;

    /// Read a register value.
    fn read_register(
        &self,
        master: MasterHandle,
        node: NodeId,
        register: Register,
        access: Access,
    ) -> Result<i32, LinkError>;

    /// Write a register value.
    fn write_register(
        &self,
        master: MasterHandle,
        node: NodeId,
        register: Register,
        value: i32,
        access: Access,
    ) -> Result<(), LinkError>;

    /// Load the node's parameter set from the named database.
    fn load_parameter_set(
        &self,
        master: MasterHandle,
        node: NodeId,
        db_name: &str,
    ) -> Result<(), LinkError>;

    /// Read the node's PDO mapping so PDO access can be resolved.
    fn read_pdo_config(&self, master: MasterHandle, node: NodeId) -> Result<(), LinkError>;

    /// Persist all parameters on the node.
    fn save_all_params(
        &self,
        master: MasterHandle,
        node: NodeId,
        timeout: Duration,
    ) -> Result<(), LinkError>;
}

/// A shared link forwards to the link it wraps, so a caller can keep a
/// handle on the transport while a session owns another.
impl<T: DeviceLink + ?Sized> DeviceLink for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn create_master(&self, transport: TransportKind) -> Result<MasterHandle, LinkError> {
        (**self).create_master(transport)
    }

    fn destroy_master(&self, master: MasterHandle) -> Result<(), LinkError> {
        (**self).destroy_master(master)
    }

    fn connect(
        &self,
        master: MasterHandle,
        descriptor: &ConnectionDescriptor,
    ) -> Result<(), LinkError> {
        (**self).connect(master, descriptor)
    }

    fn stop_master(&self, master: MasterHandle) -> Result<(), LinkError> {
        (**self).stop_master(master)
    }

    fn set_master_state(&self, master: MasterHandle, state: MasterState) -> Result<(), LinkError> {
        (**self).set_master_state(master, state)
    }

    fn scan_nodes(&self, master: MasterHandle, from: NodeId, to: NodeId) -> Result<(), LinkError> {
        (**self).scan_nodes(master, from, to)
    }

    fn is_online(&self, master: MasterHandle, node: NodeId) -> bool {
        (**self).is_online(master, node)
    }

    fn read_register(
        &self,
        master: MasterHandle,
        node: NodeId,
        register: Register,
        access: Access,
    ) -> Result<i32, LinkError> {
        (**self).read_register(master, node, register, access)
    }

    fn write_register(
        &self,
        master: MasterHandle,
        node: NodeId,
        register: Register,
        value: i32,
        access: Access,
    ) -> Result<(), LinkError> {
        (**self).write_register(master, node, register, value, access)
    }

    fn load_parameter_set(
        &self,
        master: MasterHandle,
        node: NodeId,
        db_name: &str,
    ) -> Result<(), LinkError> {
        (**self).load_parameter_set(master, node, db_name)
    }

    fn read_pdo_config(&self, master: MasterHandle, node: NodeId) -> Result<(), LinkError> {
        (**self).read_pdo_config(master, node)
    }

    fn save_all_params(
        &self,
        master: MasterHandle,
        node: NodeId,
        timeout: Duration,
    ) -> Result<(), LinkError> {
        (**self).save_all_params(master, node, timeout)
    }
}
