//! Servo Common Library
//!
//! Shared building blocks for the servo axis workspace crates.
//!
//! # Module Structure
//!
//! - [`cia402`] - Status/control word codec, drive states and work modes
//! - [`link`] - Device Link trait, register map and connection types
//! - [`units`] - User unit / device unit conversion
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Vendor defaults and settle delays
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use servo_common::cia402::{decode, AxisState};
//!
//! assert_eq!(decode(0x0237).state, AxisState::OperationEnabled);
//! ```

pub mod cia402;
pub mod config;
pub mod consts;
pub mod link;
pub mod prelude;
pub mod units;
