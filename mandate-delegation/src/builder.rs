use alloy_primitives::{Address, B256, U256};
use mandate_signer::{SignDigest, SignerAddress};

use crate::{
    AmountLimitTerms, Caveat, CaveatKind, Delegation, DelegationDomain, DelegationResult,
    EnforcerRegistry, Salt, SignedDelegation, TimeWindowTerms, Timestamp, UnsignedDelegation,
    ValueCeilingTerms, ROOT_AUTHORITY,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A builder for assembling an unsigned delegation from intent-level parameters.
///
/// Delegator, delegate, an amount decision, and an expiry decision are required typestate
/// transitions; the amount decision in particular cannot default — omitting the amount caveat
/// is a dangerous configuration a caller must opt into via [`no_amount_limit`].
///
/// Caveats are assembled in a fixed canonical order (value-ceiling, amount-limit,
/// time-window) because caveat order is hash-significant: two parties negotiating a
/// delegation must assemble identically to agree on its hash.
///
/// [`no_amount_limit`]: DelegationBuilder::no_amount_limit
pub struct DelegationBuilder<D = (), E = (), A = (), X = ()> {
    delegator: D,
    delegate: E,
    authority: B256,
    amount: A,
    expiry: X,
    not_before: Option<Timestamp>,
    allow_native_value: bool,
    extra_caveats: Vec<Caveat>,
}

/// The amount decision a builder must make before it can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountScope {
    /// Cap cumulative transfers of `token` at `max_amount` minor units.
    Limited {
        /// The token the limit applies to.
        token: Address,
        /// The maximum cumulative amount.
        max_amount: U256,
    },

    /// No amount caveat at all. Dangerous: the delegation then places no off-ledger bound on
    /// the amount transferable under it.
    Unlimited,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<D, E, A, X> DelegationBuilder<D, E, A, X> {
    /// Sets the delegator (grantor) of the delegation.
    pub fn delegator(self, delegator: Address) -> DelegationBuilder<Address, E, A, X> {
        DelegationBuilder {
            delegator,
            delegate: self.delegate,
            authority: self.authority,
            amount: self.amount,
            expiry: self.expiry,
            not_before: self.not_before,
            allow_native_value: self.allow_native_value,
            extra_caveats: self.extra_caveats,
        }
    }

    /// Sets the delegate (grantee) of the delegation.
    pub fn delegate(self, delegate: Address) -> DelegationBuilder<D, Address, A, X> {
        DelegationBuilder {
            delegator: self.delegator,
            delegate,
            authority: self.authority,
            amount: self.amount,
            expiry: self.expiry,
            not_before: self.not_before,
            allow_native_value: self.allow_native_value,
            extra_caveats: self.extra_caveats,
        }
    }

    /// Sets the parent authority this delegation narrows. Defaults to [`ROOT_AUTHORITY`].
    pub fn authority(mut self, authority: B256) -> Self {
        self.authority = authority;
        self
    }

    /// Caps cumulative transfers of `token` at `max_amount` minor units.
    pub fn amount(
        self,
        token: Address,
        max_amount: U256,
    ) -> DelegationBuilder<D, E, AmountScope, X> {
        DelegationBuilder {
            delegator: self.delegator,
            delegate: self.delegate,
            authority: self.authority,
            amount: AmountScope::Limited { token, max_amount },
            expiry: self.expiry,
            not_before: self.not_before,
            allow_native_value: self.allow_native_value,
            extra_caveats: self.extra_caveats,
        }
    }

    /// Explicitly opts out of an amount caveat. See [`AmountScope::Unlimited`].
    pub fn no_amount_limit(self) -> DelegationBuilder<D, E, AmountScope, X> {
        DelegationBuilder {
            delegator: self.delegator,
            delegate: self.delegate,
            authority: self.authority,
            amount: AmountScope::Unlimited,
            expiry: self.expiry,
            not_before: self.not_before,
            allow_native_value: self.allow_native_value,
            extra_caveats: self.extra_caveats,
        }
    }

    /// Sets the expiry (`notAfter`) of the delegation; `None` means no upper time bound.
    pub fn expiry(
        self,
        expiry: Option<Timestamp>,
    ) -> DelegationBuilder<D, E, A, Option<Timestamp>> {
        DelegationBuilder {
            delegator: self.delegator,
            delegate: self.delegate,
            authority: self.authority,
            amount: self.amount,
            expiry,
            not_before: self.not_before,
            allow_native_value: self.allow_native_value,
            extra_caveats: self.extra_caveats,
        }
    }

    /// Sets the time before which the delegation is not valid.
    pub fn not_before(mut self, not_before: Timestamp) -> Self {
        self.not_before = Some(not_before);
        self
    }

    /// Permits the delegation to carry native value, dropping the default zero value ceiling.
    pub fn allow_native_value(mut self) -> Self {
        self.allow_native_value = true;
        self
    }

    /// Appends a pre-encoded caveat after the canonical stack, e.g. for enforcer kinds this
    /// client does not interpret.
    pub fn caveat(mut self, caveat: Caveat) -> Self {
        self.extra_caveats.push(caveat);
        self
    }
}

impl DelegationBuilder<Address, Address, AmountScope, Option<Timestamp>> {
    /// Builds an unsigned delegation with caveats in canonical order and a fresh salt.
    ///
    /// No side effects beyond the returned record: no signing, no network.
    pub fn build(self, registry: &EnforcerRegistry) -> UnsignedDelegation {
        let mut caveats = Vec::with_capacity(3 + self.extra_caveats.len());

        if !self.allow_native_value {
            caveats.push(Caveat::new(
                registry.enforcer(CaveatKind::ValueCeiling),
                ValueCeilingTerms::zero().encode(),
            ));
        }

        if let AmountScope::Limited { token, max_amount } = self.amount {
            caveats.push(Caveat::new(
                registry.enforcer(CaveatKind::AmountLimit),
                AmountLimitTerms::new(token, max_amount).encode(),
            ));
        }

        if self.not_before.is_some() || self.expiry.is_some() {
            caveats.push(Caveat::new(
                registry.enforcer(CaveatKind::TimeWindow),
                TimeWindowTerms::new(self.not_before, self.expiry).encode(),
            ));
        }

        caveats.extend(self.extra_caveats);

        let salt = Salt::next();
        tracing::debug!(%salt, caveats = caveats.len(), "assembled delegation");

        Delegation::from_parts(self.delegate, self.delegator, self.authority, caveats, salt)
    }

    /// Builds and signs in one step.
    pub fn sign<K>(
        self,
        registry: &EnforcerRegistry,
        signer: &K,
        domain: &DelegationDomain,
    ) -> DelegationResult<SignedDelegation>
    where
        K: SignDigest + SignerAddress,
    {
        self.build(registry).sign(signer, domain)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for DelegationBuilder<(), (), (), ()> {
    fn default() -> Self {
        DelegationBuilder {
            delegator: (),
            delegate: (),
            authority: ROOT_AUTHORITY,
            amount: (),
            expiry: (),
            not_before: None,
            allow_native_value: false,
            extra_caveats: vec![],
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> EnforcerRegistry {
        EnforcerRegistry::new(
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
            Address::repeat_byte(0x03),
        )
    }

    #[test]
    fn test_builder_canonical_caveat_order() -> anyhow::Result<()> {
        let registry = registry();

        let delegation = Delegation::builder()
            .delegator(Address::repeat_byte(0xaa))
            .delegate(Address::repeat_byte(0xbb))
            .amount(Address::repeat_byte(0xcc), U256::from(1000))
            .expiry(Some(2000))
            .build(&registry);

        let enforcers: Vec<_> = delegation
            .caveats()
            .iter()
            .map(|caveat| caveat.enforcer)
            .collect();
        assert_eq!(
            enforcers,
            vec![
                registry.value_ceiling,
                registry.amount_limit,
                registry.time_window
            ]
        );

        assert!(delegation.is_root());

        let window = TimeWindowTerms::decode(&delegation.caveats()[2].terms)?;
        assert_eq!(window.not_before, 0);
        assert_eq!(window.not_after, 2000);

        Ok(())
    }

    #[test]
    fn test_builder_explicit_opt_outs() {
        let registry = registry();

        let delegation = Delegation::builder()
            .delegator(Address::repeat_byte(0xaa))
            .delegate(Address::repeat_byte(0xbb))
            .no_amount_limit()
            .expiry(None)
            .allow_native_value()
            .build(&registry);

        // Nothing constrains this delegation off-ledger.
        assert!(delegation.caveats().is_empty());
    }

    #[test]
    fn test_builder_preserves_opaque_caveats() {
        let registry = registry();
        let opaque = Caveat::new(Address::repeat_byte(0x77), vec![1, 2, 3]);

        let delegation = Delegation::builder()
            .delegator(Address::repeat_byte(0xaa))
            .delegate(Address::repeat_byte(0xbb))
            .amount(Address::repeat_byte(0xcc), U256::from(1000))
            .expiry(None)
            .caveat(opaque.clone())
            .build(&registry);

        assert_eq!(delegation.caveats().last(), Some(&opaque));
    }

    #[test]
    fn test_builder_assigns_distinct_salts() {
        let registry = registry();

        let build = || {
            Delegation::builder()
                .delegator(Address::repeat_byte(0xaa))
                .delegate(Address::repeat_byte(0xbb))
                .amount(Address::repeat_byte(0xcc), U256::from(1000))
                .expiry(Some(2000))
                .build(&registry)
        };

        let first = build();
        let second = build();

        assert_ne!(first.salt(), second.salt());
        assert_ne!(first.hash(), second.hash());
    }
}
