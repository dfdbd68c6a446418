use std::{
    fmt::Display,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use alloy_primitives::{Address, B256, U256};
use mandate_signer::{RecoverableSignature, SignDigest, SignerAddress};

use crate::{
    delegation_hash, signing_digest, Caveat, CaveatKind, DelegationBuilder, DelegationDomain,
    DelegationError, DelegationResult, EnforcerRegistry,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Sentinel authority value marking a delegation that draws on the delegator's own holdings
/// rather than narrowing a parent delegation.
pub const ROOT_AUTHORITY: B256 = B256::repeat_byte(0xff);

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A signed, hashable grant of bounded authority from a `delegator` to a `delegate`.
///
/// The signature slot is a type parameter: a freshly built delegation is a `Delegation<()>`
/// and becomes a `Delegation<RecoverableSignature>` once signed. Records are immutable value
/// objects; any mutation after signing would invalidate both the hash and the signature, so
/// none is offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegation<S = ()> {
    /// Identity of the grantee.
    pub(crate) delegate: Address,

    /// Identity of the grantor.
    pub(crate) delegator: Address,

    /// Either [`ROOT_AUTHORITY`] or the canonical hash of exactly one parent delegation.
    pub(crate) authority: B256,

    /// Ordered constraints; order is part of the canonical hash and must be preserved.
    pub(crate) caveats: Vec<Caveat>,

    /// Nonce ensuring hash uniqueness between otherwise-identical delegations.
    pub(crate) salt: Salt,

    /// The delegator's signature over the canonical hash, once present.
    pub(crate) signature: S,
}

/// A delegation carrying its delegator's signature.
pub type SignedDelegation = Delegation<RecoverableSignature>;

/// A delegation that has not been signed yet.
pub type UnsignedDelegation = Delegation<()>;

/// A numeric nonce distinguishing otherwise-identical delegations.
///
/// Two delegations from the same delegator with identical fields and identical salts are
/// indistinguishable, so [`Salt::next`] draws from a process-wide strictly increasing
/// millisecond clock: rapid successive calls can never collide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Salt(u128);

static LAST_SALT: AtomicU64 = AtomicU64::new(0);

//--------------------------------------------------------------------------------------------------
// Methods: Delegation
//--------------------------------------------------------------------------------------------------

impl Delegation {
    /// Creates a convenience builder for constructing a new delegation.
    pub fn builder() -> DelegationBuilder {
        DelegationBuilder::default()
    }
}

impl<S> Delegation<S> {
    /// Returns the identity of the grantee.
    pub fn delegate(&self) -> &Address {
        &self.delegate
    }

    /// Returns the identity of the grantor.
    pub fn delegator(&self) -> &Address {
        &self.delegator
    }

    /// Returns the authority this delegation narrows, or [`ROOT_AUTHORITY`].
    pub fn authority(&self) -> &B256 {
        &self.authority
    }

    /// Returns the ordered caveats.
    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    /// Returns the salt.
    pub fn salt(&self) -> Salt {
        self.salt
    }

    /// Whether this delegation draws on the delegator's own holdings.
    pub fn is_root(&self) -> bool {
        self.authority == ROOT_AUTHORITY
    }

    /// Computes the canonical structural hash (see [`delegation_hash`]).
    pub fn hash(&self) -> B256 {
        delegation_hash(self)
    }

    /// Computes the digest the delegator signs for the given verifying context.
    pub fn signing_digest(&self, domain: &DelegationDomain) -> B256 {
        signing_digest(self.hash(), domain)
    }

    /// Returns the first caveat of the given kind, per the registry's enforcer mapping.
    pub fn find_caveat(&self, kind: CaveatKind, registry: &EnforcerRegistry) -> Option<&Caveat> {
        let enforcer = registry.enforcer(kind);
        self.caveats.iter().find(|caveat| caveat.enforcer == enforcer)
    }
}

impl UnsignedDelegation {
    /// Constructs a delegation from its individual fields.
    pub fn from_parts(
        delegate: Address,
        delegator: Address,
        authority: B256,
        caveats: Vec<Caveat>,
        salt: Salt,
    ) -> Self {
        Self {
            delegate,
            delegator,
            authority,
            caveats,
            salt,
            signature: (),
        }
    }

    /// Signs the delegation for the given verifying context.
    ///
    /// The signer's identity must be the delegator; anyone else holding a key cannot produce
    /// a grant on the delegator's behalf.
    pub fn sign<K>(self, signer: &K, domain: &DelegationDomain) -> DelegationResult<SignedDelegation>
    where
        K: SignDigest + SignerAddress,
    {
        if signer.address() != self.delegator {
            return Err(DelegationError::IdentityMismatch {
                role: "delegator",
                expected: self.delegator,
                found: signer.address(),
            });
        }

        let digest = self.signing_digest(domain);
        let signature = signer.sign_digest(&digest)?;
        tracing::debug!(hash = %self.hash(), "signed delegation");

        Ok(Delegation {
            delegate: self.delegate,
            delegator: self.delegator,
            authority: self.authority,
            caveats: self.caveats,
            salt: self.salt,
            signature,
        })
    }

    /// Attaches an externally produced signature without verifying it.
    ///
    /// Used when restoring a record from its interchange document; call
    /// [`SignedDelegation::verify_signature`] to check authenticity.
    pub fn with_signature(self, signature: RecoverableSignature) -> SignedDelegation {
        Delegation {
            delegate: self.delegate,
            delegator: self.delegator,
            authority: self.authority,
            caveats: self.caveats,
            salt: self.salt,
            signature,
        }
    }
}

impl SignedDelegation {
    /// Returns the delegator's signature.
    pub fn signature(&self) -> &RecoverableSignature {
        &self.signature
    }

    /// Verifies that the signature recovers to the delegator under the given verifying
    /// context.
    pub fn verify_signature(&self, domain: &DelegationDomain) -> DelegationResult<()> {
        let digest = self.signing_digest(domain);
        let recovered = self.signature.recover(&digest)?;

        if recovered != self.delegator {
            return Err(DelegationError::IdentityMismatch {
                role: "delegator",
                expected: self.delegator,
                found: recovered,
            });
        }

        Ok(())
    }

    /// Discards the signature, e.g. to rebuild and re-sign with different caveats.
    pub fn into_unsigned(self) -> UnsignedDelegation {
        Delegation {
            delegate: self.delegate,
            delegator: self.delegator,
            authority: self.authority,
            caveats: self.caveats,
            salt: self.salt,
            signature: (),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Methods: Salt
//--------------------------------------------------------------------------------------------------

impl Salt {
    /// Draws the next salt from the process-wide strictly increasing clock.
    pub fn next() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);

        let previous = LAST_SALT
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);

        Self(u128::from(now.max(previous + 1)))
    }

    /// Returns the numeric value of the salt.
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Encodes the salt as a 32-byte big-endian unsigned integer.
    pub fn to_be_bytes(self) -> [u8; 32] {
        U256::from(self.0).to_be_bytes::<32>()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl From<u128> for Salt {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl Display for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Salt {
    type Err = DelegationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .parse::<u128>()
            .map_err(|_| DelegationError::InvalidSalt(s.to_string()))?;
        Ok(Self(value))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use mandate_signer::{Secp256k1Signer, SignerAddress};

    use super::*;

    fn domain() -> DelegationDomain {
        DelegationDomain::new(1, Address::repeat_byte(0xd1))
    }

    #[test]
    fn test_salt_is_strictly_increasing() {
        let salts: Vec<Salt> = (0..100).map(|_| Salt::next()).collect();

        for pair in salts.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_salt_display_roundtrip() -> anyhow::Result<()> {
        let salt = Salt::from(1_717_171_717_000u128);
        assert_eq!(salt.to_string().parse::<Salt>()?, salt);
        assert!("not a number".parse::<Salt>().is_err());

        Ok(())
    }

    #[test_log::test]
    fn test_sign_requires_delegator_identity() -> anyhow::Result<()> {
        let delegator = Secp256k1Signer::generate(&mut rand::thread_rng());
        let stranger = Secp256k1Signer::generate(&mut rand::thread_rng());

        let delegation = Delegation::from_parts(
            Address::repeat_byte(0xbb),
            delegator.address(),
            ROOT_AUTHORITY,
            vec![],
            Salt::next(),
        );

        assert!(matches!(
            delegation.clone().sign(&stranger, &domain()),
            Err(DelegationError::IdentityMismatch { .. })
        ));

        let signed = delegation.sign(&delegator, &domain())?;
        signed.verify_signature(&domain())?;

        Ok(())
    }

    #[test_log::test]
    fn test_verify_rejects_foreign_domain() -> anyhow::Result<()> {
        let delegator = Secp256k1Signer::generate(&mut rand::thread_rng());

        let signed = Delegation::from_parts(
            Address::repeat_byte(0xbb),
            delegator.address(),
            ROOT_AUTHORITY,
            vec![],
            Salt::next(),
        )
        .sign(&delegator, &domain())?;

        let foreign = DelegationDomain::new(999, Address::repeat_byte(0xd1));
        assert!(signed.verify_signature(&foreign).is_err());

        Ok(())
    }

    #[test]
    fn test_hash_ignores_signature_presence() -> anyhow::Result<()> {
        let delegator = Secp256k1Signer::generate(&mut rand::thread_rng());

        let unsigned = Delegation::from_parts(
            Address::repeat_byte(0xbb),
            delegator.address(),
            ROOT_AUTHORITY,
            vec![],
            Salt::from(42u128),
        );

        let before = unsigned.hash();
        let signed = unsigned.sign(&delegator, &domain())?;
        assert_eq!(signed.hash(), before);

        Ok(())
    }
}
