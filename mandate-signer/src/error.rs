//! Error types of the mandate-signer crate.

use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result type for signer operations.
pub type SignerResult<T> = Result<T, SignerError>;

/// Defines the types of errors that can occur in signer operations.
#[derive(Debug, Error)]
pub enum SignerError {
    /// Errors from the underlying secp256k1 implementation.
    #[error("secp256k1 error: {0}")]
    Secp256k1(#[from] libsecp256k1::Error),

    /// A signature blob does not have the expected 65-byte length.
    #[error("invalid signature length: expected 65 bytes, got {0}")]
    SignatureLength(usize),

    /// A recovery byte is outside the accepted range.
    #[error("invalid recovery byte: {0}")]
    InvalidRecoveryByte(u8),

    /// Hex decoding errors.
    #[error("hex decoding error: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates an `Ok` `SignerResult`.
#[allow(non_snake_case)]
pub fn Ok<T>(value: T) -> SignerResult<T> {
    Result::Ok(value)
}
