//! Register access scoped to one node of one master.

use servo_common::cia402::{ControlWord, StatusWord};
use servo_common::link::{Access, DeviceLink, LinkError, MasterHandle, NodeId, Register};
use tracing::trace;

/// Borrowed view of a Device Link master, addressing a single node.
///
/// Copying a port is cheap; every copy talks to the same master.
#[derive(Debug)]
pub struct NodePort<'a, L: DeviceLink> {
    link: &'a L,
    master: MasterHandle,
    node: NodeId,
}

impl<L: DeviceLink> Clone for NodePort<'_, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L: DeviceLink> Copy for NodePort<'_, L> {}

impl<'a, L: DeviceLink> NodePort<'a, L> {
    pub fn new(link: &'a L, master: MasterHandle, node: NodeId) -> Self {
        Self { link, master, node }
    }

    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn master(&self) -> MasterHandle {
        self.master
    }

    #[inline]
    pub fn link(&self) -> &'a L {
        self.link
    }

    pub fn read(&self, register: Register, access: Access) -> Result<i32, LinkError> {
        let value = self
            .link
            .read_register(self.master, self.node, register, access)?;
        trace!(node = %self.node, register = %register, ?access, value, "read");
        Ok(value)
    }

    pub fn write(&self, register: Register, value: i32, access: Access) -> Result<(), LinkError> {
        trace!(node = %self.node, register = %register, ?access, value, "write");
        self.link
            .write_register(self.master, self.node, register, value, access)
    }

    /// Read and wrap the statusword.
    pub fn read_status(&self, access: Access) -> Result<StatusWord, LinkError> {
        let raw = self.read(Register::StatusWord, access)?;
        Ok(StatusWord::from_raw(raw as u16))
    }

    pub fn write_control(&self, word: ControlWord, access: Access) -> Result<(), LinkError> {
        self.write(Register::ControlWord, i32::from(word.raw()), access)
    }
}
