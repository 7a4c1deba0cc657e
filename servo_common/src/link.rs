//! Device Link interface.
//!
//! The fieldbus transport (master creation, scan, SDO/PDO marshalling,
//! parameter databases) lives outside this workspace. This module describes
//! the primitives the controller consumes from it.

pub mod driver;
pub mod registers;
pub mod types;

pub use driver::{DeviceLink, LinkError};
pub use registers::Register;
pub use types::{
    Access, BaudRate, ConnectionDescriptor, MasterHandle, MasterState, NodeId, TransportKind,
};
