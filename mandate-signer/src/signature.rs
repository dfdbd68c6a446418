use std::{fmt::Display, ops::Deref, str::FromStr};

use alloy_primitives::{hex, keccak256, Address, B256};
use libsecp256k1::{Message, RecoveryId, Signature};

use crate::{SignerError, SignerResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Length of a recoverable signature: 32-byte `r`, 32-byte `s`, 1-byte `v`.
pub const SIGNATURE_LENGTH: usize = 65;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A recoverable ECDSA signature in the `r ‖ s ‖ v` layout an on-ledger verifier consumes.
///
/// The recovery byte `v` is stored in its legacy `27`/`28` form. From the signed digest and
/// this signature alone the signer's address can be recovered, so no public key travels with
/// a signed delegation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature([u8; SIGNATURE_LENGTH]);

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl RecoverableSignature {
    /// Creates a signature from its raw 65-byte layout.
    pub fn new(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Creates a signature from a byte slice, rejecting any length other than 65.
    pub fn from_slice(bytes: &[u8]) -> SignerResult<Self> {
        let bytes: [u8; SIGNATURE_LENGTH] = bytes
            .try_into()
            .map_err(|_| SignerError::SignatureLength(bytes.len()))?;

        Ok(Self(bytes))
    }

    /// Returns the `r` component.
    pub fn r(&self) -> B256 {
        B256::from_slice(&self.0[..32])
    }

    /// Returns the `s` component.
    pub fn s(&self) -> B256 {
        B256::from_slice(&self.0[32..64])
    }

    /// Returns the recovery byte in its legacy form.
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// Returns the raw bytes of the signature.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Converts the signature into a vector of bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Recovers the address that signed the given digest.
    pub fn recover(&self, digest: &B256) -> SignerResult<Address> {
        let message = Message::parse(&digest.0);
        let signature = Signature::parse_standard_slice(&self.0[..64])?;
        let recovery_id = RecoveryId::parse(normalize_recovery_byte(self.0[64])?)?;

        let public_key = libsecp256k1::recover(&message, &signature, &recovery_id)?;
        Ok(address_of_public_key(&public_key))
    }
}

/// Derives the address of an uncompressed secp256k1 public key: the last 20 bytes of the
/// keccak-256 digest of the 64-byte key material.
pub(crate) fn address_of_public_key(public_key: &libsecp256k1::PublicKey) -> Address {
    let uncompressed = public_key.serialize();
    let digest = keccak256(&uncompressed[1..]);
    Address::from_slice(&digest[12..])
}

/// Maps a legacy `27`/`28` recovery byte (or a raw `0`..`3` one) to the raw form.
fn normalize_recovery_byte(v: u8) -> SignerResult<u8> {
    match v {
        0..=3 => Ok(v),
        27..=30 => Ok(v - 27),
        other => Err(SignerError::InvalidRecoveryByte(other)),
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for RecoverableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode_prefixed(self.0))
    }
}

impl FromStr for RecoverableSignature {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = hex::decode(s)?;
        Self::from_slice(&decoded)
    }
}

impl From<[u8; SIGNATURE_LENGTH]> for RecoverableSignature {
    fn from(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl From<RecoverableSignature> for Vec<u8> {
    fn from(signature: RecoverableSignature) -> Self {
        signature.to_vec()
    }
}

impl Deref for RecoverableSignature {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
