//! Software Device Link.
//!
//! `SimulatedLink` implements [`DeviceLink`] on top of one
//! [`SimulatedDrive`] per configured node. Every call is journaled before it
//! is executed, so failed calls show up in the journal too.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use servo_common::cia402::AxisState;
use servo_common::link::{
    Access, ConnectionDescriptor, DeviceLink, LinkError, MasterHandle, MasterState, NodeId,
    Register, TransportKind,
};
use tracing::{debug, info, trace};

use crate::drive::SimulatedDrive;
use crate::journal::{CallJournal, LinkCall};

/// Status reads a set-point takes unless configured otherwise.
pub const DEFAULT_READS_PER_MOVE: u32 = 5;

#[derive(Debug)]
struct MasterRecord {
    connected: bool,
    state: MasterState,
}

#[derive(Debug)]
struct NodeRecord {
    drive: SimulatedDrive,
    offline: bool,
    pdo_configured: bool,
    parameter_db: Option<String>,
    saves: u32,
}

#[derive(Debug, Default)]
struct SimState {
    journal: CallJournal,
    masters: HashMap<u32, MasterRecord>,
    next_handle: u32,
    nodes: BTreeMap<NodeId, NodeRecord>,
    scanned: BTreeSet<NodeId>,
    refuse_connect: bool,
}

impl SimState {
    fn master(&self, master: MasterHandle) -> Result<&MasterRecord, LinkError> {
        self.masters
            .get(&master.raw())
            .ok_or(LinkError::MasterNotExist)
    }

    fn running_master(&self, master: MasterHandle) -> Result<&MasterRecord, LinkError> {
        let record = self.master(master)?;
        if record.connected {
            Ok(record)
        } else {
            Err(LinkError::MasterNotRunning)
        }
    }

    /// Resolve a node for register traffic over `access`.
    fn node_for(
        &mut self,
        master: MasterHandle,
        node: NodeId,
        access: Access,
    ) -> Result<&mut NodeRecord, LinkError> {
        let state = self.running_master(master)?.state;
        if !self.scanned.contains(&node) {
            return Err(LinkError::NodeNotOnline(node));
        }
        let record = self
            .nodes
            .get_mut(&node)
            .filter(|r| !r.offline)
            .ok_or(LinkError::NodeNotOnline(node))?;
        if !access.is_sdo() {
            if state != MasterState::Operational {
                return Err(LinkError::OperationNotAllowed(
                    "PDO access requires an operational master".to_string(),
                ));
            }
            if !record.pdo_configured {
                return Err(LinkError::OperationNotAllowed(format!(
                    "PDO mapping of node {node} not read"
                )));
            }
        }
        Ok(record)
    }

    fn online_node(&mut self, master: MasterHandle, node: NodeId) -> Result<&mut NodeRecord, LinkError> {
        self.running_master(master)?;
        if !self.scanned.contains(&node) {
            return Err(LinkError::NodeNotOnline(node));
        }
        self.nodes
            .get_mut(&node)
            .filter(|r| !r.offline)
            .ok_or(LinkError::NodeNotOnline(node))
    }
}

/// Simulated fieldbus master with CiA-402 drives behind it.
///
/// # Example
///
/// ```rust
/// use servo_common::link::{DeviceLink, NodeId, TransportKind};
/// use servo_sim::SimulatedLink;
///
/// let link = SimulatedLink::with_nodes([NodeId::new(1).unwrap()]);
/// let master = link.create_master(TransportKind::CanOpen).unwrap();
/// assert_eq!(link.calls().len(), 1);
/// # let _ = master;
/// ```
#[derive(Debug)]
pub struct SimulatedLink {
    state: Mutex<SimState>,
    reads_per_move: u32,
}

impl SimulatedLink {
    /// Link with the given nodes attached, set-points completing after
    /// [`DEFAULT_READS_PER_MOVE`] status reads.
    pub fn with_nodes(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self::with_reads_per_move(nodes, DEFAULT_READS_PER_MOVE)
    }

    /// Link whose drives complete set-points after `reads_per_move` reads.
    pub fn with_reads_per_move(nodes: impl IntoIterator<Item = NodeId>, reads_per_move: u32) -> Self {
        let nodes = nodes
            .into_iter()
            .map(|node| {
                (
                    node,
                    NodeRecord {
                        drive: SimulatedDrive::new(reads_per_move),
                        offline: false,
                        pdo_configured: false,
                        parameter_db: None,
                        saves: 0,
                    },
                )
            })
            .collect();
        Self {
            state: Mutex::new(SimState {
                nodes,
                next_handle: 1,
                ..SimState::default()
            }),
            reads_per_move,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_drive<R>(&self, node: NodeId, f: impl FnOnce(&mut SimulatedDrive) -> R) -> Option<R> {
        self.lock().nodes.get_mut(&node).map(|r| f(&mut r.drive))
    }

    /// Status reads a set-point takes on this link.
    pub fn reads_per_move(&self) -> u32 {
        self.reads_per_move
    }

    // ─── Knobs ──────────────────────────────────────────────────────

    /// Make `node` miss (or answer) subsequent scans and register traffic.
    pub fn set_offline(&self, node: NodeId, offline: bool) {
        if let Some(record) = self.lock().nodes.get_mut(&node) {
            record.offline = offline;
        }
    }

    /// Fail `connect` with `NoAvailableDevice`.
    pub fn refuse_connect(&self, refuse: bool) {
        self.lock().refuse_connect = refuse;
    }

    /// Keep target reached low for every set-point on `node`.
    pub fn set_never_reach(&self, node: NodeId, never: bool) {
        self.with_drive(node, |d| d.set_never_reach(never));
    }

    /// Override the mode display echo of `node`.
    pub fn set_mode_echo(&self, node: NodeId, code: Option<i32>) {
        self.with_drive(node, |d| d.set_mode_echo(code));
    }

    /// Put `node` into fault reaction with `error_code`.
    pub fn inject_fault(&self, node: NodeId, error_code: u16) {
        self.with_drive(node, |d| d.inject_fault(error_code));
    }

    /// Refuse writes to `register` on `node` (`None` clears).
    pub fn fail_writes(&self, node: NodeId, register: Option<Register>) {
        self.with_drive(node, |d| d.fail_writes(register));
    }

    // ─── Inspection ─────────────────────────────────────────────────

    /// Snapshot of the journal.
    pub fn journal(&self) -> CallJournal {
        self.lock().journal.clone()
    }

    /// Every call issued so far.
    pub fn calls(&self) -> Vec<LinkCall> {
        self.lock().journal.calls().to_vec()
    }

    /// Register writes in issue order.
    pub fn writes(&self) -> Vec<(Register, i32, Access)> {
        self.lock().journal.writes()
    }

    /// Reads of `register` so far.
    pub fn read_count(&self, register: Register) -> usize {
        self.lock().journal.read_count(register)
    }

    /// Register writes so far.
    pub fn write_count(&self) -> usize {
        self.lock().journal.write_count()
    }

    /// Forget every recorded call.
    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    /// Power state of `node`'s drive.
    pub fn drive_state(&self, node: NodeId) -> Option<AxisState> {
        self.with_drive(node, |d| d.state())
    }

    /// Actual position of `node` in counts.
    pub fn position(&self, node: NodeId) -> Option<i32> {
        self.with_drive(node, |d| d.position())
    }

    /// Digital output register of `node`.
    pub fn digital_outputs(&self, node: NodeId) -> Option<i32> {
        self.with_drive(node, |d| d.digital_outputs())
    }

    /// Parameter database loaded for `node`.
    pub fn parameter_db(&self, node: NodeId) -> Option<String> {
        self.lock().nodes.get(&node).and_then(|r| r.parameter_db.clone())
    }

    /// Number of parameter saves issued for `node`.
    pub fn save_count(&self, node: NodeId) -> u32 {
        self.lock().nodes.get(&node).map_or(0, |r| r.saves)
    }

    /// Number of live masters.
    pub fn master_count(&self) -> usize {
        self.lock().masters.len()
    }

    /// NMT state of `master`, if it exists.
    pub fn master_state(&self, master: MasterHandle) -> Option<MasterState> {
        self.lock().masters.get(&master.raw()).map(|m| m.state)
    }
}

impl DeviceLink for SimulatedLink {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn create_master(&self, transport: TransportKind) -> Result<MasterHandle, LinkError> {
        let mut sim = self.lock();
        sim.journal.record(LinkCall::CreateMaster(transport));
        if transport == TransportKind::Modbus {
            return Err(LinkError::UnsupportedTransport(transport));
        }
        let handle = MasterHandle::from_raw(sim.next_handle);
        sim.next_handle += 1;
        sim.masters.insert(
            handle.raw(),
            MasterRecord {
                connected: false,
                state: MasterState::PreOperational,
            },
        );
        info!(%handle, %transport, "Simulated master created");
        Ok(handle)
    }

    fn destroy_master(&self, master: MasterHandle) -> Result<(), LinkError> {
        let mut sim = self.lock();
        sim.journal.record(LinkCall::DestroyMaster);
        if sim.master(master)?.connected {
            return Err(LinkError::OperationNotAllowed(
                "master must be stopped before it is destroyed".to_string(),
            ));
        }
        sim.masters.remove(&master.raw());
        sim.scanned.clear();
        info!(handle = %master, "Simulated master destroyed");
        Ok(())
    }

    fn connect(
        &self,
        master: MasterHandle,
        descriptor: &ConnectionDescriptor,
    ) -> Result<(), LinkError> {
        let connection = descriptor
            .to_connection_string()
            .map_err(|e| LinkError::InvalidParameter(e.to_string()))?;
        let mut sim = self.lock();
        sim.journal.record(LinkCall::Connect(connection.clone()));
        sim.master(master)?;
        descriptor
            .validate()
            .map_err(|e| LinkError::InvalidParameter(e.to_string()))?;
        if sim.refuse_connect {
            return Err(LinkError::NoAvailableDevice);
        }
        if let Some(record) = sim.masters.get_mut(&master.raw()) {
            record.connected = true;
        }
        debug!(%connection, "Simulated master connected");
        Ok(())
    }

    fn stop_master(&self, master: MasterHandle) -> Result<(), LinkError> {
        let mut sim = self.lock();
        sim.journal.record(LinkCall::StopMaster);
        sim.running_master(master)?;
        if let Some(record) = sim.masters.get_mut(&master.raw()) {
            record.connected = false;
            record.state = MasterState::PreOperational;
        }
        Ok(())
    }

    fn set_master_state(&self, master: MasterHandle, state: MasterState) -> Result<(), LinkError> {
        let mut sim = self.lock();
        sim.journal.record(LinkCall::SetMasterState(state));
        sim.running_master(master)?;
        if let Some(record) = sim.masters.get_mut(&master.raw()) {
            record.state = state;
        }
        debug!(?state, "Simulated master state");
        Ok(())
    }

    fn scan_nodes(&self, master: MasterHandle, from: NodeId, to: NodeId) -> Result<(), LinkError> {
        let mut sim = self.lock();
        sim.journal.record(LinkCall::ScanNodes { from, to });
        sim.running_master(master)?;
        if from > to {
            return Err(LinkError::InvalidParameter(format!(
                "scan range {from}..={to} is empty"
            )));
        }
        let found: BTreeSet<NodeId> = sim
            .nodes
            .iter()
            .filter(|(node, record)| (from..=to).contains(*node) && !record.offline)
            .map(|(node, _)| *node)
            .collect();
        debug!(found = found.len(), "Simulated scan complete");
        sim.scanned = found;
        Ok(())
    }

    fn is_online(&self, master: MasterHandle, node: NodeId) -> bool {
        let mut sim = self.lock();
        sim.journal.record(LinkCall::IsOnline(node));
        sim.running_master(master).is_ok()
            && sim.scanned.contains(&node)
            && sim.nodes.get(&node).is_some_and(|r| !r.offline)
    }

    fn read_register(
        &self,
        master: MasterHandle,
        node: NodeId,
        register: Register,
        access: Access,
    ) -> Result<i32, LinkError> {
        let mut sim = self.lock();
        sim.journal.record(LinkCall::read(node, register, access));
        let record = sim.node_for(master, node, access)?;
        let value = record.drive.read(register);
        trace!(%node, %register, ?access, value, "Simulated read");
        Ok(value)
    }

    fn write_register(
        &self,
        master: MasterHandle,
        node: NodeId,
        register: Register,
        value: i32,
        access: Access,
    ) -> Result<(), LinkError> {
        let mut sim = self.lock();
        sim.journal.record(LinkCall::write(node, register, value, access));
        let record = sim.node_for(master, node, access)?;
        trace!(%node, %register, ?access, value, "Simulated write");
        record.drive.write(register, value)
    }

    fn load_parameter_set(
        &self,
        master: MasterHandle,
        node: NodeId,
        db_name: &str,
    ) -> Result<(), LinkError> {
        let mut sim = self.lock();
        sim.journal.record(LinkCall::LoadParameterSet {
            node,
            db_name: db_name.to_string(),
        });
        let record = sim.online_node(master, node)?;
        if db_name.trim().is_empty() {
            return Err(LinkError::LoadParameterSetFailed(
                "empty database name".to_string(),
            ));
        }
        record.parameter_db = Some(db_name.to_string());
        Ok(())
    }

    fn read_pdo_config(&self, master: MasterHandle, node: NodeId) -> Result<(), LinkError> {
        let mut sim = self.lock();
        sim.journal.record(LinkCall::ReadPdoConfig(node));
        let record = sim.online_node(master, node)?;
        record.pdo_configured = true;
        Ok(())
    }

    fn save_all_params(
        &self,
        master: MasterHandle,
        node: NodeId,
        timeout: Duration,
    ) -> Result<(), LinkError> {
        let mut sim = self.lock();
        sim.journal.record(LinkCall::SaveAllParams(node));
        let record = sim.online_node(master, node)?;
        if timeout.is_zero() {
            return Err(LinkError::SaveParamsFailed("zero timeout".to_string()));
        }
        record.saves += 1;
        Ok(())
    }
}
