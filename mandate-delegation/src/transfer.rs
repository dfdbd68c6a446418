use alloy_primitives::{Address, U256};

use crate::{
    AmountLimitTerms, CaveatKind, Delegation, DelegationChain, DelegationResult,
    EnforcerRegistry, TimeWindowTerms, Timestamp, Validity, Violation,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A proposed token transfer to be checked against a delegation's caveats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferIntent {
    /// The token to transfer.
    pub token: Address,

    /// The recipient of the transfer.
    pub recipient: Address,

    /// The amount to transfer, in the token's minor unit.
    pub amount: U256,
}

/// Decides whether a proposed transfer is admissible under every caveat of the delegation
/// being redeemed.
///
/// Only caveat kinds this client understands are checked; unrecognized enforcers are skipped,
/// because the external verifier is authoritative and a client must not block an otherwise
/// admissible action over a caveat it cannot interpret. Value-ceiling caveats are also not
/// checked here: token transfers carry zero native value by construction.
///
/// Every check is a pure function of its inputs: results are never cached, and the caller
/// supplies the evaluation time fresh on each call, so a delegation whose window has not
/// opened yet is invalid now and may become valid later.
#[derive(Debug, Clone, Copy)]
pub struct TransferValidator<'r> {
    registry: &'r EnforcerRegistry,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl TransferIntent {
    /// Creates a transfer intent.
    pub fn new(token: Address, recipient: Address, amount: U256) -> Self {
        Self {
            token,
            recipient,
            amount,
        }
    }
}

impl<'r> TransferValidator<'r> {
    /// Creates a transfer validator over the given enforcer registry.
    pub fn new(registry: &'r EnforcerRegistry) -> Self {
        Self { registry }
    }

    /// Checks the transfer against every caveat of a single delegation, collecting all
    /// violations found.
    ///
    /// A delegation with zero checkable caveats passes (there is no off-ledger information
    /// to contradict the transfer); the returned outcome reports itself
    /// [unchecked][Validity::is_unchecked] so callers can flag the configuration.
    pub fn check<S>(
        &self,
        delegation: &Delegation<S>,
        intent: &TransferIntent,
        now: Timestamp,
    ) -> DelegationResult<Validity> {
        let mut validity = Validity::new();

        for caveat in delegation.caveats() {
            match self.registry.kind_of(caveat.enforcer) {
                Some(CaveatKind::AmountLimit) => {
                    let limit = AmountLimitTerms::decode(&caveat.terms)?;
                    validity.mark_checked();

                    if intent.token != limit.token {
                        validity.record(Violation::TokenNotAuthorized {
                            authorized: limit.token,
                            requested: intent.token,
                        });
                    } else if intent.amount > limit.max_amount {
                        validity.record(Violation::AmountExceedsLimit {
                            limit: limit.max_amount,
                            requested: intent.amount,
                        });
                    }
                }
                Some(CaveatKind::TimeWindow) => {
                    let window = TimeWindowTerms::decode(&caveat.terms)?;
                    validity.mark_checked();

                    if window.not_before != 0 && u128::from(now) < window.not_before {
                        validity.record(Violation::NotYetActive {
                            not_before: window.not_before,
                            now,
                        });
                    }
                    if window.not_after != 0 && u128::from(now) >= window.not_after {
                        validity.record(Violation::Expired {
                            not_after: window.not_after,
                            now,
                        });
                    }
                }
                Some(CaveatKind::ValueCeiling) => {
                    // Token transfers carry no native value; the ceiling binds other
                    // execution shapes and is enforced by the external verifier.
                }
                None => {
                    tracing::debug!(enforcer = %caveat.enforcer, "skipping unrecognized caveat");
                }
            }
        }

        Ok(validity)
    }

    /// Checks the transfer against every link of a chain, folding all violations into one
    /// outcome.
    pub fn check_chain(
        &self,
        chain: &DelegationChain,
        intent: &TransferIntent,
        now: Timestamp,
    ) -> DelegationResult<Validity> {
        let mut validity = Validity::new();

        for delegation in chain.iter() {
            validity.merge(self.check(delegation, intent, now)?);
        }

        Ok(validity)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::{Caveat, DelegationError};

    use super::*;

    fn registry() -> EnforcerRegistry {
        EnforcerRegistry::new(
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
            Address::repeat_byte(0x03),
        )
    }

    fn token() -> Address {
        Address::repeat_byte(0xcc)
    }

    fn recipient() -> Address {
        Address::repeat_byte(0xee)
    }

    fn delegation(
        registry: &EnforcerRegistry,
        max_amount: u64,
        expiry: Option<Timestamp>,
    ) -> crate::UnsignedDelegation {
        Delegation::builder()
            .delegator(Address::repeat_byte(0xaa))
            .delegate(Address::repeat_byte(0xbb))
            .amount(token(), U256::from(max_amount))
            .expiry(expiry)
            .build(registry)
    }

    #[test]
    fn test_admissible_transfer_passes() -> anyhow::Result<()> {
        let registry = registry();
        let validator = TransferValidator::new(&registry);
        let delegation = delegation(&registry, 1000, Some(2000));

        let intent = TransferIntent::new(token(), recipient(), U256::from(500));
        let validity = validator.check(&delegation, &intent, 1500)?;

        assert!(validity.is_valid());
        assert!(!validity.is_unchecked());

        Ok(())
    }

    #[test]
    fn test_validation_is_idempotent() -> anyhow::Result<()> {
        let registry = registry();
        let validator = TransferValidator::new(&registry);
        let delegation = delegation(&registry, 40, Some(1000));

        let intent = TransferIntent::new(token(), recipient(), U256::from(50));

        let first = validator.check(&delegation, &intent, 500)?;
        let second = validator.check(&delegation, &intent, 500)?;
        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn test_temporal_sensitivity() -> anyhow::Result<()> {
        let registry = registry();
        let validator = TransferValidator::new(&registry);

        let delegation = Delegation::builder()
            .delegator(Address::repeat_byte(0xaa))
            .delegate(Address::repeat_byte(0xbb))
            .amount(token(), U256::from(1000))
            .not_before(1000)
            .expiry(Some(2000))
            .build(&registry);

        let intent = TransferIntent::new(token(), recipient(), U256::from(1));

        // Before the window opens.
        let validity = validator.check(&delegation, &intent, 999)?;
        assert!(matches!(
            validity.violations(),
            [Violation::NotYetActive { .. }]
        ));

        // Inside the window.
        assert!(validator.check(&delegation, &intent, 1000)?.is_valid());
        assert!(validator.check(&delegation, &intent, 1999)?.is_valid());

        // At and past the close.
        let validity = validator.check(&delegation, &intent, 2000)?;
        assert!(matches!(validity.violations(), [Violation::Expired { .. }]));

        Ok(())
    }

    #[test]
    fn test_multiple_violations_in_one_call() -> anyhow::Result<()> {
        let registry = registry();
        let validator = TransferValidator::new(&registry);

        // Limit of 40 and a window that closed at 100.
        let delegation = delegation(&registry, 40, Some(100));
        let intent = TransferIntent::new(token(), recipient(), U256::from(50));

        let validity = validator.check(&delegation, &intent, 200)?;
        assert_eq!(validity.violations().len(), 2);
        assert!(matches!(
            validity.violations()[0],
            Violation::AmountExceedsLimit { .. }
        ));
        assert!(matches!(validity.violations()[1], Violation::Expired { .. }));

        Ok(())
    }

    #[test]
    fn test_wrong_token_is_a_violation() -> anyhow::Result<()> {
        let registry = registry();
        let validator = TransferValidator::new(&registry);
        let delegation = delegation(&registry, 1000, None);

        let intent = TransferIntent::new(Address::repeat_byte(0xdd), recipient(), U256::from(1));
        let validity = validator.check(&delegation, &intent, 0)?;

        assert!(matches!(
            validity.violations(),
            [Violation::TokenNotAuthorized { .. }]
        ));

        Ok(())
    }

    #[test]
    fn test_unrecognized_caveats_are_skipped() -> anyhow::Result<()> {
        let registry = registry();
        let validator = TransferValidator::new(&registry);

        let delegation = Delegation::builder()
            .delegator(Address::repeat_byte(0xaa))
            .delegate(Address::repeat_byte(0xbb))
            .amount(token(), U256::from(1000))
            .expiry(None)
            .caveat(Caveat::new(Address::repeat_byte(0x77), vec![0xde, 0xad]))
            .build(&registry);

        let intent = TransferIntent::new(token(), recipient(), U256::from(500));
        assert!(validator.check(&delegation, &intent, 0)?.is_valid());

        Ok(())
    }

    #[test]
    fn test_zero_caveats_is_an_unchecked_pass() -> anyhow::Result<()> {
        let registry = registry();
        let validator = TransferValidator::new(&registry);

        let delegation = Delegation::builder()
            .delegator(Address::repeat_byte(0xaa))
            .delegate(Address::repeat_byte(0xbb))
            .no_amount_limit()
            .expiry(None)
            .allow_native_value()
            .build(&registry);

        let intent = TransferIntent::new(token(), recipient(), U256::MAX);
        let validity = validator.check(&delegation, &intent, 0)?;

        assert!(validity.is_valid());
        assert!(validity.is_unchecked());

        Ok(())
    }

    #[test]
    fn test_malformed_terms_are_a_decode_error() {
        let registry = registry();
        let validator = TransferValidator::new(&registry);

        let delegation = Delegation::builder()
            .delegator(Address::repeat_byte(0xaa))
            .delegate(Address::repeat_byte(0xbb))
            .no_amount_limit()
            .expiry(None)
            .caveat(Caveat::new(registry.amount_limit, vec![1, 2, 3]))
            .build(&registry);

        let intent = TransferIntent::new(token(), recipient(), U256::from(1));
        assert!(matches!(
            validator.check(&delegation, &intent, 0),
            Err(DelegationError::TermsLength { .. })
        ));
    }
}
