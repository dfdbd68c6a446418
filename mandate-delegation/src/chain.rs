use std::ops::Index;

use alloy_primitives::B256;

use crate::{DelegationDomain, DelegationError, DelegationResult, SignedDelegation};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An ordered sequence of delegations from the leaf being redeemed back to a root, as the
/// external execution surface expects to receive it.
///
/// A chain only exists once its linkage has been verified: every link's `authority` must
/// equal the recomputed hash of the next record, and every link must hand authority to the
/// party that narrows it. Derived data — chains are assembled at execution time, never
/// persisted as an independent source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationChain {
    links: Vec<SignedDelegation>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DelegationChain {
    /// Assembles the chain for a leaf delegation by resolving each `authority` against a pool
    /// of candidate parent records.
    ///
    /// Fails with [`DelegationError::MissingParent`] when an authority resolves to no record
    /// in the pool — including the case where the record is present but tampered, since its
    /// recomputed hash then no longer matches anything.
    pub fn assemble(
        leaf: SignedDelegation,
        pool: &[SignedDelegation],
    ) -> DelegationResult<Self> {
        let mut links = vec![leaf];

        loop {
            let current = &links[links.len() - 1];
            if current.is_root() {
                break;
            }

            let authority = *current.authority();
            let parent = pool
                .iter()
                .find(|candidate| candidate.hash() == authority)
                .ok_or(DelegationError::MissingParent(authority))?;

            if parent.delegate() != current.delegator() {
                return Err(DelegationError::PrincipalMisaligned {
                    expected: *parent.delegate(),
                    found: *current.delegator(),
                });
            }

            links.push(parent.clone());
        }

        tracing::debug!(links = links.len(), leaf = %links[0].hash(), "assembled chain");
        Ok(Self { links })
    }

    /// Verifies an already-ordered leaf-to-root sequence and wraps it as a chain.
    ///
    /// Fails with [`DelegationError::ChainIntegrity`] when any link's recorded authority does
    /// not match the recomputed hash of the next record — e.g. a tampered middle link.
    pub fn verify(links: Vec<SignedDelegation>) -> DelegationResult<Self> {
        let Some(last) = links.last() else {
            return Err(DelegationError::EmptyChain);
        };

        if !last.is_root() {
            return Err(DelegationError::MissingParent(*last.authority()));
        }

        for pair in links.windows(2) {
            let (child, parent) = (&pair[0], &pair[1]);

            let parent_hash = parent.hash();
            if *child.authority() != parent_hash {
                return Err(DelegationError::ChainIntegrity {
                    expected: *child.authority(),
                    found: parent_hash,
                });
            }

            if parent.delegate() != child.delegator() {
                return Err(DelegationError::PrincipalMisaligned {
                    expected: *parent.delegate(),
                    found: *child.delegator(),
                });
            }
        }

        Ok(Self { links })
    }

    /// Returns the delegation actually being redeemed.
    pub fn leaf(&self) -> &SignedDelegation {
        &self.links[0]
    }

    /// Returns the root delegation.
    pub fn root(&self) -> &SignedDelegation {
        &self.links[self.links.len() - 1]
    }

    /// Returns the number of links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// A chain is never empty; provided for clippy symmetry.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates the links from leaf to root.
    pub fn iter(&self) -> impl Iterator<Item = &SignedDelegation> {
        self.links.iter()
    }

    /// Returns the canonical hash of every link, leaf to root.
    pub fn hashes(&self) -> Vec<B256> {
        self.links.iter().map(|link| link.hash()).collect()
    }

    /// Verifies every link's signature against its delegator for the given verifying context.
    pub fn verify_signatures(&self, domain: &DelegationDomain) -> DelegationResult<()> {
        for link in &self.links {
            link.verify_signature(domain)?;
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Index<usize> for DelegationChain {
    type Output = SignedDelegation;

    fn index(&self, index: usize) -> &Self::Output {
        &self.links[index]
    }
}

impl From<DelegationChain> for Vec<SignedDelegation> {
    fn from(chain: DelegationChain) -> Self {
        chain.links
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
