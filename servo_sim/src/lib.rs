//! Simulated Device Link for the servo axis workspace.
//!
//! Provides a software fieldbus master ([`SimulatedLink`]) backed by one
//! CiA-402 drive model per node ([`SimulatedDrive`]). Every Device Link call
//! is recorded in a [`CallJournal`] so scenario tests can assert exact call
//! ordering.

pub mod drive;
pub mod journal;
pub mod link;

pub use drive::{status_pattern, SimulatedDrive};
pub use journal::{CallJournal, LinkCall};
pub use link::{SimulatedLink, DEFAULT_READS_PER_MOVE};
