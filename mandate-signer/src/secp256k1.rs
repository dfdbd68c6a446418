use alloy_primitives::{Address, B256};
use libsecp256k1::{Message, PublicKey, SecretKey};
use rand_core::CryptoRngCore;

use crate::{
    address_of_public_key, RecoverableSignature, SignDigest, SignerAddress, SignerResult,
    VerifyDigest,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A local [`secp256k1`][ref] signer holding a key pair in process memory.
///
/// Intended for development, tests, and CLI use; production deployments are expected to put a
/// hardware or remote signer behind the same [`SignDigest`] seam.
///
/// [ref]: https://en.bitcoin.it/wiki/Secp256k1
pub struct Secp256k1Signer {
    secret_key: SecretKey,
    public_key: PublicKey,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Secp256k1Signer {
    /// Generates a signer from a cryptographically secure random number generator.
    pub fn generate(rng: &mut impl CryptoRngCore) -> Self {
        let secret_key = SecretKey::random(rng);
        let public_key = PublicKey::from_secret_key(&secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Constructs a signer from its 32-byte private key.
    pub fn from_private_key(bytes: &[u8]) -> SignerResult<Self> {
        let secret_key = SecretKey::parse_slice(bytes)?;
        let public_key = PublicKey::from_secret_key(&secret_key);
        Ok(Self {
            secret_key,
            public_key,
        })
    }

    /// Returns the private key bytes.
    pub fn private_key_bytes(&self) -> Vec<u8> {
        self.secret_key.serialize().to_vec()
    }

    /// Returns the uncompressed public key bytes.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key.serialize().to_vec()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl SignDigest for Secp256k1Signer {
    fn sign_digest(&self, digest: &B256) -> SignerResult<RecoverableSignature> {
        let message = Message::parse(&digest.0);
        let (signature, recovery_id) = libsecp256k1::sign(&message, &self.secret_key);

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&signature.serialize());
        bytes[64] = recovery_id.serialize() + 27;

        Ok(RecoverableSignature::new(bytes))
    }
}

impl SignerAddress for Secp256k1Signer {
    fn address(&self) -> Address {
        address_of_public_key(&self.public_key)
    }
}

impl VerifyDigest for Secp256k1Signer {
    fn verify_digest(
        &self,
        digest: &B256,
        signature: &RecoverableSignature,
        expected: &Address,
    ) -> SignerResult<bool> {
        let recovered = signature.recover(digest)?;
        Ok(&recovered == expected)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
