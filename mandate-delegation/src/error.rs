//! Error types of the mandate-delegation crate.

use alloy_primitives::{Address, B256};
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result type for delegation operations.
pub type DelegationResult<T> = Result<T, DelegationError>;

/// Defines the types of errors that can occur in delegation operations.
///
/// Validators never use this type to report that a proposed narrowing or transfer is merely
/// inadmissible; invalidity is an ordinary return value carrying the full violation list (see
/// [`Validity`][crate::Validity]). Errors are reserved for structurally impossible situations:
/// malformed bytes, broken chain linkage, wrong identities, failed collaborators.
#[derive(Debug, Error)]
pub enum DelegationError {
    /// A caveat terms blob does not have the exact length its kind requires.
    #[error("invalid {kind} terms: expected {expected} bytes, got {found}")]
    TermsLength {
        /// Name of the caveat kind whose decode failed.
        kind: &'static str,
        /// The fixed length the kind's layout requires.
        expected: usize,
        /// The length actually found.
        found: usize,
    },

    /// A delegation names an authority no record in the provided pool hashes to.
    #[error("no parent record found for authority {0}")]
    MissingParent(B256),

    /// A link's recorded authority does not match the recomputed hash of its purported parent.
    #[error("chain integrity broken: authority {expected} recorded, parent hashes to {found}")]
    ChainIntegrity {
        /// The authority value the child carries.
        expected: B256,
        /// The hash the purported parent record actually computes to.
        found: B256,
    },

    /// Adjacent links do not hand authority to the right party.
    #[error("principal misaligned: parent delegates to {expected}, child is delegated by {found}")]
    PrincipalMisaligned {
        /// The parent's delegate.
        expected: Address,
        /// The child's delegator.
        found: Address,
    },

    /// A caller-supplied identity does not match the field required for the operation.
    #[error("identity mismatch: operation requires {role} {expected}, got {found}")]
    IdentityMismatch {
        /// The role the identity was required to fill.
        role: &'static str,
        /// The identity the delegation record requires.
        expected: Address,
        /// The identity actually supplied.
        found: Address,
    },

    /// A scope comparison was attempted across different tokens.
    #[error("cannot compare scopes across tokens: parent limits {parent}, child requests {child}")]
    TokenMismatch {
        /// Token of the parent's amount-limit caveat.
        parent: Address,
        /// Token the child requested.
        child: Address,
    },

    /// A chain must contain at least one delegation.
    #[error("delegation chain is empty")]
    EmptyChain,

    /// A document's salt field is not a decimal integer.
    #[error("invalid salt: {0}")]
    InvalidSalt(String),

    /// A document carries no signature where one is required.
    #[error("document has no signature")]
    MissingSignature,

    /// A document's advisory hash does not match the recomputed canonical hash.
    #[error("stored delegation hash {stored} does not match recomputed {computed}")]
    MetaHashMismatch {
        /// The hash recorded in the document's advisory metadata.
        stored: B256,
        /// The hash recomputed from the document's hashed fields.
        computed: B256,
    },

    /// Signer errors.
    #[error("signer error: {0}")]
    Signer(#[from] mandate_signer::SignerError),

    /// Json (de)serialization errors.
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hex decoding errors.
    #[error("hex decoding error: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),

    /// An external collaborator (signer service, ledger) failed.
    #[error("external failure: {0}")]
    External(String),
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates an `Ok` `DelegationResult`.
#[allow(non_snake_case)]
pub fn Ok<T>(value: T) -> DelegationResult<T> {
    Result::Ok(value)
}
