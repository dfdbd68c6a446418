#![warn(missing_docs)]
#![allow(clippy::module_inception)]

//! The ledger-client boundary of the mandate delegation engine.
//!
//! The core validates off-ledger; the ledger is the authority. This crate defines the
//! async seam a ledger client implements — simulate, submit, revocation queries — and ships
//! an in-memory reference ledger that mirrors the external verifier's accounting (cumulative
//! spend per delegation, revocation cascade) for tests and dry runs.

mod client;
mod error;
mod memory;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use client::*;
pub use error::*;
pub use memory::*;
