#![warn(missing_docs)]
#![allow(clippy::module_inception)]

//! Signing primitives for the mandate delegation engine.
//!
//! A delegation is signed over a 32-byte typed-data digest. This crate provides
//! the trait seam the core expects from a signer, a recoverable `r ‖ s ‖ v`
//! signature type, and a local secp256k1 signer for development and tests.

mod error;
mod secp256k1;
mod signature;
mod traits;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use error::*;
pub use secp256k1::*;
pub use signature::*;
pub use traits::*;
