use alloy_primitives::{Address, B256};

use crate::{RecoverableSignature, SignerResult};

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// A trait for signers that can produce a recoverable signature over a 32-byte digest.
///
/// The digest is expected to already be domain-separated; implementations sign it as-is
/// and never hash again.
pub trait SignDigest {
    /// Signs a 32-byte digest with a signing key.
    fn sign_digest(&self, digest: &B256) -> SignerResult<RecoverableSignature>;
}

/// A trait for signer identities that correspond to an on-ledger address.
pub trait SignerAddress {
    /// Returns the address this signer's signatures recover to.
    fn address(&self) -> Address;
}

/// A trait for verifying that a recoverable signature over a digest was produced
/// by a given address.
pub trait VerifyDigest {
    /// Verifies a signature against a digest and an expected signer address.
    fn verify_digest(
        &self,
        digest: &B256,
        signature: &RecoverableSignature,
        expected: &Address,
    ) -> SignerResult<bool>;
}
