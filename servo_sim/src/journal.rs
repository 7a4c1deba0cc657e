//! Ordered record of every Device Link call made against the simulator.

use servo_common::link::{Access, MasterState, NodeId, Register, TransportKind};

/// One Device Link call, as issued by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCall {
    CreateMaster(TransportKind),
    DestroyMaster,
    /// Carries the rendered vendor connection string.
    Connect(String),
    StopMaster,
    SetMasterState(MasterState),
    ScanNodes { from: NodeId, to: NodeId },
    IsOnline(NodeId),
    Read {
        node: NodeId,
        register: Register,
        access: Access,
    },
    Write {
        node: NodeId,
        register: Register,
        value: i32,
        access: Access,
    },
    LoadParameterSet { node: NodeId, db_name: String },
    ReadPdoConfig(NodeId),
    SaveAllParams(NodeId),
}

impl LinkCall {
    /// Shorthand for a register read entry.
    pub fn read(node: NodeId, register: Register, access: Access) -> Self {
        Self::Read {
            node,
            register,
            access,
        }
    }

    /// Shorthand for a register write entry.
    pub fn write(node: NodeId, register: Register, value: i32, access: Access) -> Self {
        Self::Write {
            node,
            register,
            value,
            access,
        }
    }
}

/// Append-only call journal.
#[derive(Debug, Default, Clone)]
pub struct CallJournal {
    calls: Vec<LinkCall>,
}

impl CallJournal {
    pub fn record(&mut self, call: LinkCall) {
        self.calls.push(call);
    }

    /// Every call in issue order.
    pub fn calls(&self) -> &[LinkCall] {
        &self.calls
    }

    /// Register writes in issue order as `(register, value, access)`.
    pub fn writes(&self) -> Vec<(Register, i32, Access)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                LinkCall::Write {
                    register,
                    value,
                    access,
                    ..
                } => Some((*register, *value, *access)),
                _ => None,
            })
            .collect()
    }

    /// Number of reads of `register`.
    pub fn read_count(&self, register: Register) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, LinkCall::Read { register: r, .. } if *r == register))
            .count()
    }

    /// Number of register writes of any kind.
    pub fn write_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, LinkCall::Write { .. }))
            .count()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}
