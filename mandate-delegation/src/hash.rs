use alloy_primitives::{keccak256, B256};
use lazy_static::lazy_static;

use crate::{Caveat, Delegation, DelegationDomain};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

lazy_static! {
    /// Typehash of a single caveat. `args` is deliberately absent from the type string: runtime
    /// arguments are never covered by the signature.
    pub static ref CAVEAT_TYPEHASH: B256 = keccak256(b"Caveat(address enforcer,bytes terms)");

    /// Typehash of a delegation record.
    pub static ref DELEGATION_TYPEHASH: B256 = keccak256(
        b"Delegation(address delegate,address delegator,bytes32 authority,Caveat[] caveats,uint256 salt)"
    );
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Computes the canonical hash of a single caveat.
///
/// `keccak256(CAVEAT_TYPEHASH ‖ pad32(enforcer) ‖ keccak256(terms))` — the terms blob is
/// hashed, not embedded, so the caveat hash has a fixed preimage layout regardless of the
/// terms length of the caveat's kind.
pub fn caveat_hash(caveat: &Caveat) -> B256 {
    let mut buf = Vec::with_capacity(3 * 32);
    buf.extend_from_slice(CAVEAT_TYPEHASH.as_slice());
    buf.extend_from_slice(B256::left_padding_from(caveat.enforcer.as_slice()).as_slice());
    buf.extend_from_slice(keccak256(&caveat.terms).as_slice());
    keccak256(buf)
}

/// Computes the canonical hash of an ordered caveat list: the hash of the concatenation of
/// each caveat's hash, in list order. Order is part of the identity.
pub fn caveats_hash(caveats: &[Caveat]) -> B256 {
    let mut buf = Vec::with_capacity(caveats.len() * 32);
    for caveat in caveats {
        buf.extend_from_slice(caveat_hash(caveat).as_slice());
    }
    keccak256(buf)
}

/// Computes the canonical structural hash of a delegation.
///
/// This hash is both the payload the delegator signs (after domain separation, see
/// [`signing_digest`]) and the identifier a child delegation records as its `authority`. It is
/// computed identically whether or not the delegation has been signed; the signature is placed
/// over the hash, never under it.
pub fn delegation_hash<S>(delegation: &Delegation<S>) -> B256 {
    let mut buf = Vec::with_capacity(6 * 32);
    buf.extend_from_slice(DELEGATION_TYPEHASH.as_slice());
    buf.extend_from_slice(B256::left_padding_from(delegation.delegate().as_slice()).as_slice());
    buf.extend_from_slice(B256::left_padding_from(delegation.delegator().as_slice()).as_slice());
    buf.extend_from_slice(delegation.authority().as_slice());
    buf.extend_from_slice(caveats_hash(delegation.caveats()).as_slice());
    buf.extend_from_slice(&delegation.salt().to_be_bytes());
    keccak256(buf)
}

/// Computes the digest a signer actually signs: the structural hash bound to a verifying
/// context via the standard `0x19 0x01` typed-data prefix.
pub fn signing_digest(delegation_hash: B256, domain: &DelegationDomain) -> B256 {
    let mut buf = Vec::with_capacity(2 + 2 * 32);
    buf.extend_from_slice(&[0x19, 0x01]);
    buf.extend_from_slice(domain.separator().as_slice());
    buf.extend_from_slice(delegation_hash.as_slice());
    keccak256(buf)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
