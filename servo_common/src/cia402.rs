//! CiA-402 drive profile codec.
//!
//! Pure, stateless translation between the 16-bit device words and the
//! semantic types the controller works with.

pub mod control;
pub mod mode;
pub mod status;

use static_assertions::const_assert_eq;

pub use control::{encode, ControlWord, PowerRequest};
pub use mode::WorkMode;
pub use status::{decode, target_reached, AxisState, DecodedStatus, StatusWord};

// Both words travel as UNSIGNED16 in the object dictionary.
const_assert_eq!(core::mem::size_of::<StatusWord>(), 2);
const_assert_eq!(core::mem::size_of::<ControlWord>(), 2);
