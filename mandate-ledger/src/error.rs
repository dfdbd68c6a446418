//! Error types of the mandate-ledger crate.

use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Defines the types of errors that can occur in ledger operations.
///
/// A simulation that reverts is not an error — it is a reported outcome. Errors cover the
/// cases where the ledger could not be consulted at all.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The redemption payload was structurally unusable.
    #[error("delegation error: {0}")]
    Delegation(#[from] mandate_delegation::DelegationError),

    /// The ledger could not be reached or answered out of protocol.
    #[error("transport failure: {0}")]
    Transport(String),
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates an `Ok` `LedgerResult`.
#[allow(non_snake_case)]
pub fn Ok<T>(value: T) -> LedgerResult<T> {
    Result::Ok(value)
}
