//! Session: Device Link master lifecycle and axis initialization.
//!
//! A `Session` owns the link and one master for its whole lifetime. Axis
//! handles borrow it, so the master cannot be torn down while an axis is
//! still in use.
//!
//! # Lifecycle
//!
//! 1. [`Session::init`] creates the master
//! 2. [`Session::connect`] opens the adapter
//! 3. [`Session::initialize_axis`] brings one node up and returns its handle
//! 4. [`Session::close`] powers recorded nodes off and tears the master down

use std::cell::RefCell;
use std::thread;

use servo_common::cia402::{encode, PowerRequest};
use servo_common::config::ConfigError;
use servo_common::link::{
    Access, ConnectionDescriptor, DeviceLink, MasterHandle, MasterState, NodeId, TransportKind,
};
use tracing::{debug, error, info, warn};

use crate::axis::AxisHandle;
use crate::config::{AxisConfig, LinkConfig, ScanRange, SettleTimes};
use crate::error::{AxisError, AxisResult};
use crate::port::NodePort;

/// Owns the Device Link and its master; hands out axis handles.
#[derive(Debug)]
pub struct Session<L: DeviceLink> {
    link: L,
    master: MasterHandle,
    transport: TransportKind,
    timing: SettleTimes,
    nodes: RefCell<Vec<NodeId>>,
}

/// Name used for the session in the component overview.
pub type AxisLifecycleManager<L> = Session<L>;

impl<L: DeviceLink> Session<L> {
    /// Create a master for `transport` on `link`.
    pub fn init(link: L, transport: TransportKind) -> AxisResult<Self> {
        let master = link.create_master(transport)?;
        info!(link = link.name(), %transport, %master, "Master created");
        Ok(Self {
            link,
            master,
            transport,
            timing: SettleTimes::default(),
            nodes: RefCell::new(Vec::new()),
        })
    }

    /// `init` followed by `connect`, from a `[link]` section.
    pub fn open(link: L, config: &LinkConfig) -> AxisResult<Self> {
        config.validate()?;
        let mut session = Self::init(link, config.transport)?;
        session.connect(&config.connection)?;
        Ok(session)
    }

    /// Settle delays used by `close` for the master transition and
    /// the per-node power-off.
    pub fn with_timing(mut self, timing: SettleTimes) -> Self {
        self.timing = timing;
        self
    }

    /// Open the adapter described by `descriptor`.
    ///
    /// # Errors
    ///
    /// `Configuration` for a malformed descriptor (no link call is made),
    /// `Transport` if the link refuses.
    pub fn connect(&mut self, descriptor: &ConnectionDescriptor) -> AxisResult<()> {
        descriptor.validate()?;
        self.link.connect(self.master, descriptor)?;
        info!(
            master = %self.master,
            device_type = %descriptor.device_type,
            baud_kbps = descriptor.baud_rate.kbps(),
            "Master connected"
        );
        Ok(())
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn master(&self) -> MasterHandle {
        self.master
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    /// Nodes brought up by `initialize_axis`, in order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.nodes.borrow().clone()
    }

    /// Bring `config.node_id` up and return its handle.
    ///
    /// Sequence: pre-operational, scan, online check, parameter set, PDO
    /// mapping, unit factor, fault reset, operational. The first failing
    /// step aborts; nothing is retried.
    ///
    /// # Errors
    ///
    /// `Configuration` before any link call, `NotOnline` if the node
    /// missed the scan, otherwise the failing step's error.
    pub fn initialize_axis(
        &self,
        config: &AxisConfig,
        scan: &ScanRange,
    ) -> AxisResult<AxisHandle<'_, L>> {
        config.validate()?;
        scan.validate()?;
        let node = config.node_id;
        if !scan.contains(node) {
            return Err(ConfigError::invalid(format!(
                "node {node} outside scan range {scan}"
            ))
            .into());
        }
        let timing = config.timing;

        self.set_master_state(MasterState::PreOperational, &timing)?;
        self.link.scan_nodes(self.master, scan.from, scan.to)?;
        if !self.link.is_online(self.master, node) {
            warn!(%node, %scan, "Node not found by scan");
            return Err(AxisError::NotOnline { node });
        }
        self.link
            .load_parameter_set(self.master, node, &config.parameter_db)?;
        self.link.read_pdo_config(self.master, node)?;
        debug!(%node, db = %config.parameter_db, "Parameters and PDO mapping loaded");

        let mut axis = AxisHandle::new(NodePort::new(&self.link, self.master, node), config)?;
        axis.set_units_factor(config.units_factor)?;
        axis.clear_fault()?;

        self.set_master_state(MasterState::Operational, &timing)?;
        {
            let mut nodes = self.nodes.borrow_mut();
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }
        info!(%node, factor = %config.units_factor, "Axis initialized");
        Ok(axis)
    }

    fn set_master_state(&self, state: MasterState, timing: &SettleTimes) -> AxisResult<()> {
        self.link.set_master_state(self.master, state)?;
        thread::sleep(timing.master_state());
        debug!(master = %self.master, ?state, "Master state");
        Ok(())
    }

    /// Power off every initialized node, return the master to
    /// pre-operational, stop and destroy it, and hand the link back.
    ///
    /// Every step runs even after a failure; the first error is returned.
    /// Brake handling stays with the caller.
    pub fn close(self) -> AxisResult<L> {
        let mut first: Option<AxisError> = None;
        let mut note = |result: AxisResult<()>, step: &str| {
            if let Err(e) = result {
                error!(step, error = %e, "Teardown step failed");
                if first.is_none() {
                    first = Some(e);
                }
            }
        };

        for node in self.nodes.borrow().iter().copied() {
            let port = NodePort::new(&self.link, self.master, node);
            note(
                port.write_control(encode(PowerRequest::PowerOff), Access::Sdo)
                    .map_err(AxisError::from),
                "power off",
            );
            thread::sleep(self.timing.power_off());
        }
        note(
            self.set_master_state(MasterState::PreOperational, &self.timing),
            "pre-operational",
        );
        note(
            self.link.stop_master(self.master).map_err(AxisError::from),
            "stop master",
        );
        note(
            self.link.destroy_master(self.master).map_err(AxisError::from),
            "destroy master",
        );

        match first {
            Some(e) => Err(e),
            None => {
                info!(master = %self.master, "Session closed");
                Ok(self.link)
            }
        }
    }
}
