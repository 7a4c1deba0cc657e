//! Bounded polling for the target-reached flag.

use std::thread;
use std::time::{Duration, Instant};

use servo_common::cia402::StatusWord;
use servo_common::config::ConfigError;
use servo_common::consts::{DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
use servo_common::link::{Access, DeviceLink};
use tracing::{debug, error, warn};

use crate::error::{AxisError, AxisResult};
use crate::port::NodePort;

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Reached { polls: u32, elapsed: Duration },
    TimedOut { polls: u32, elapsed: Duration },
    /// Fault bit seen; the wait stopped on that poll.
    Faulted { status: StatusWord, polls: u32 },
}

impl WaitOutcome {
    pub fn reached(&self) -> bool {
        matches!(self, Self::Reached { .. })
    }

    /// Status reads issued.
    pub fn polls(&self) -> u32 {
        match *self {
            Self::Reached { polls, .. }
            | Self::TimedOut { polls, .. }
            | Self::Faulted { polls, .. } => polls,
        }
    }

    /// `Ok(())` when reached, `Timeout` or `Fault` otherwise.
    pub fn into_result(self) -> AxisResult<()> {
        match self {
            Self::Reached { .. } => Ok(()),
            Self::TimedOut { elapsed, .. } => Err(AxisError::Timeout { waited: elapsed }),
            Self::Faulted { status, .. } => Err(AxisError::Fault { status }),
        }
    }
}

/// Polls the statusword until target reached, fault, or timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetMonitor {
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for TargetMonitor {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl TargetMonitor {
    /// # Errors
    ///
    /// `ConfigError::ValidationError` for a zero poll interval.
    pub fn new(timeout: Duration, poll_interval: Duration) -> Result<Self, ConfigError> {
        if poll_interval.is_zero() {
            return Err(ConfigError::invalid("poll interval must be > 0"));
        }
        Ok(Self {
            timeout,
            poll_interval,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll until done. Each poll is a fresh PDO read; at least one read is
    /// made, and after each miss the loop sleeps one interval and stops once
    /// the timeout has elapsed.
    ///
    /// # Errors
    ///
    /// Only link errors; timeouts and faults are outcomes.
    pub fn wait<L: DeviceLink>(&self, port: &NodePort<'_, L>) -> AxisResult<WaitOutcome> {
        let start = Instant::now();
        let mut polls = 0u32;
        loop {
            let status = port.read_status(Access::Pdo)?;
            polls += 1;

            if status.is_fault() {
                error!(node = %port.node(), %status, polls, "Drive fault while waiting for target");
                return Ok(WaitOutcome::Faulted { status, polls });
            }
            if status.target_reached() {
                let elapsed = start.elapsed();
                debug!(node = %port.node(), polls, ?elapsed, "Target reached");
                return Ok(WaitOutcome::Reached { polls, elapsed });
            }

            thread::sleep(self.poll_interval);
            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                warn!(node = %port.node(), polls, ?elapsed, "Target not reached before timeout");
                return Ok(WaitOutcome::TimedOut { polls, elapsed });
            }
        }
    }
}
