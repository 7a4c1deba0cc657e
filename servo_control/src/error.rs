//! Controller error taxonomy.
//!
//! Every failure carries an [`ErrorKind`] so callers can branch on the
//! category without matching individual variants.

use std::time::Duration;

use servo_common::cia402::{AxisState, StatusWord, WorkMode};
use servo_common::config::ConfigError;
use servo_common::link::{LinkError, NodeId};
use thiserror::Error;

/// Error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Master creation, connect, state transition or register traffic failed.
    Transport,
    /// Target node did not answer the scan.
    NotOnline,
    /// Mode not echoed, or a command rejected before any device write.
    ModeMismatch,
    /// Bounded wait expired.
    Timeout,
    /// Drive reports a latched fault.
    Fault,
    /// Invalid configuration or argument, rejected before device interaction.
    Configuration,
    /// Power stage did not confirm the enable request.
    PowerStage,
}

/// Errors raised by the axis controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AxisError {
    #[error("Device link error: {0}")]
    Transport(#[from] LinkError),

    #[error("Node {node} is not online")]
    NotOnline { node: NodeId },

    #[error("Mode mismatch: expected {expected}, drive reports {observed}")]
    ModeMismatch { expected: WorkMode, observed: i32 },

    /// Motion requested while the power stage is not in operation.
    #[error("Axis not enabled (state: {state})")]
    NotEnabled { state: AxisState },

    /// Moving command while the holding brake is engaged.
    #[error("Brake engaged on node {node}")]
    BrakeEngaged { node: NodeId },

    #[error("Target not reached within {waited:?}")]
    Timeout { waited: Duration },

    #[error("Drive fault (status word {status})")]
    Fault { status: StatusWord },

    #[error("Enable not confirmed (status word {status})")]
    EnableFailed { status: StatusWord },

    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl AxisError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(LinkError::NodeNotOnline(_)) | Self::NotOnline { .. } => {
                ErrorKind::NotOnline
            }
            Self::Transport(_) => ErrorKind::Transport,
            Self::ModeMismatch { .. } | Self::NotEnabled { .. } | Self::BrakeEngaged { .. } => {
                ErrorKind::ModeMismatch
            }
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Fault { .. } => ErrorKind::Fault,
            Self::EnableFailed { .. } => ErrorKind::PowerStage,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }
}

/// Result alias for controller operations.
pub type AxisResult<T> = Result<T, AxisError>;
