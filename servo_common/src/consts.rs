//! Workspace-wide constants for the servo axis controller.
//!
//! Single source of truth for node address bounds, vendor defaults and the
//! settle delays that bracket power, mode and brake transitions.

use std::time::Duration;

/// Lowest valid node address on the fieldbus.
pub const NODE_ID_MIN: u8 = 1;

/// Highest valid node address on the fieldbus.
pub const NODE_ID_MAX: u8 = 127;

/// Default first address of the node scan.
pub const DEFAULT_SCAN_FROM: u8 = 1;

/// Default last address of the node scan.
pub const DEFAULT_SCAN_TO: u8 = 10;

/// Default parameter database loaded for a node.
pub const DEFAULT_PARAMETER_DB: &str = "CANopen.db";

/// Default device units per user unit (encoder counts per mm).
pub const DEFAULT_UNITS_FACTOR: f64 = 10_000.0;

/// Default device type in the connection descriptor.
pub const DEFAULT_DEVICE_TYPE: &str = "1001";

/// Default PDO refresh interval in milliseconds.
pub const DEFAULT_PDO_INTERVAL_MS: u32 = 10;

/// Default SYNC interval in milliseconds.
pub const DEFAULT_SYNC_INTERVAL_MS: u32 = 10;

/// Wait after the power stage is commanded on, before the single status check.
pub const POWER_ON_SETTLE: Duration = Duration::from_millis(200);

/// Wait after the power stage is commanded off.
pub const POWER_OFF_SETTLE: Duration = Duration::from_millis(50);

/// Wait between the work-mode write and its read-back.
pub const MODE_SWITCH_SETTLE: Duration = Duration::from_millis(50);

/// Wait for the mechanical brake to release or engage.
pub const BRAKE_SETTLE: Duration = Duration::from_millis(100);

/// Wait after a master state transition (pre-operational / operational).
pub const MASTER_STATE_SETTLE: Duration = Duration::from_millis(50);

/// Default upper bound for a target-reached wait.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval between target-reached polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default timeout handed to the device for a parameter save.
pub const DEFAULT_SAVE_TIMEOUT: Duration = Duration::from_secs(5);
