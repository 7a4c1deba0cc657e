//! # Servo Control Library
//!
//! Single-axis CiA-402 servo controller. Sequences the power stage, selects
//! work modes, issues motion commands, waits for completion and coordinates
//! the holding brake, all through a [`DeviceLink`](servo_common::link::DeviceLink).
//!
//! ## Components
//!
//! 1. **Session**: master lifecycle and axis initialization
//! 2. **AxisHandle**: application surface for one node
//! 3. **ModeController**: power-off, mode write, echo check
//! 4. **Motion dispatch**: precondition checks and set-point writes
//! 5. **TargetMonitor**: bounded target-reached polling
//! 6. **BrakeSequencer**: brake output with settle delays
//!
//! ## Execution Model
//!
//! Synchronous and blocking. Settle delays are plain sleeps; the cyclic
//! process data exchange belongs to the link.

pub mod axis;
pub mod brake;
pub mod config;
pub mod error;
pub mod mode;
pub mod monitor;
pub mod motion;
pub mod port;
pub mod power;
pub mod session;

pub use axis::{AxisHandle, StatusSnapshot};
pub use brake::{BrakeSequencer, BrakeState};
pub use config::{AxisConfig, ControllerConfig, LinkConfig, MotionProfile, ScanRange, SettleTimes};
pub use error::{AxisError, AxisResult, ErrorKind};
pub use monitor::{TargetMonitor, WaitOutcome};
pub use motion::{Direction, MotionCommand};
pub use session::{AxisLifecycleManager, Session};
