use alloy_primitives::{Address, U256};

use crate::{
    AmountLimitTerms, CaveatKind, Delegation, DelegationError, DelegationResult,
    EnforcerRegistry, TimeWindowTerms, Timestamp, Validity, Violation,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The scope a prospective child delegation asks for, compared against its parent before the
/// child is built and signed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildScope {
    /// The amount limit the child will carry, if any.
    pub amount: Option<AmountLimitTerms>,

    /// The expiry (`notAfter`) the child will carry, if any.
    pub expiry: Option<Timestamp>,
}

/// Enforces that a child delegation's requested scope is contained within its parent's
/// decoded scope.
///
/// This check is advisory: the external verifier enforces only leaf-level caveats at
/// redemption time and does not re-verify narrowing per sub-delegation step. A bug here is a
/// client-side safety net failing, not a breach of the security boundary — a property to
/// preserve, not a gap to fix with invented on-ledger re-validation.
#[derive(Debug, Clone, Copy)]
pub struct ScopeValidator<'r> {
    registry: &'r EnforcerRegistry,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ChildScope {
    /// Creates an empty scope request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests an amount limit.
    pub fn with_amount(mut self, token: Address, max_amount: U256) -> Self {
        self.amount = Some(AmountLimitTerms::new(token, max_amount));
        self
    }

    /// Requests an expiry.
    pub fn with_expiry(mut self, expiry: Timestamp) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

impl<'r> ScopeValidator<'r> {
    /// Creates a scope validator over the given enforcer registry.
    pub fn new(registry: &'r EnforcerRegistry) -> Self {
        Self { registry }
    }

    /// Checks every narrowing dimension and returns the complete violation list in one pass.
    ///
    /// A dimension the parent does not constrain is unconstrained here; callers wanting a
    /// stricter "parent must carry a limit" policy layer it on top. Comparing amounts across
    /// different tokens is structurally meaningless and returns an error rather than a
    /// verdict.
    pub fn check<S>(
        &self,
        parent: &Delegation<S>,
        child: &ChildScope,
    ) -> DelegationResult<Validity> {
        let mut validity = Validity::new();

        if let (Some(requested), Some(caveat)) = (
            &child.amount,
            parent.find_caveat(CaveatKind::AmountLimit, self.registry),
        ) {
            let limit = AmountLimitTerms::decode(&caveat.terms)?;

            if limit.token != requested.token {
                return Err(DelegationError::TokenMismatch {
                    parent: limit.token,
                    child: requested.token,
                });
            }

            validity.mark_checked();
            if requested.max_amount > limit.max_amount {
                validity.record(Violation::AmountExceedsLimit {
                    limit: limit.max_amount,
                    requested: requested.max_amount,
                });
            }
        }

        if let (Some(requested), Some(caveat)) = (
            child.expiry,
            parent.find_caveat(CaveatKind::TimeWindow, self.registry),
        ) {
            let window = TimeWindowTerms::decode(&caveat.terms)?;

            if window.not_after != 0 {
                validity.mark_checked();
                if u128::from(requested) > window.not_after {
                    validity.record(Violation::ExpiryExceedsParent {
                        parent_not_after: window.not_after,
                        requested,
                    });
                }
            }
        }

        tracing::debug!(parent = %parent.hash(), %validity, "scope check");
        Ok(validity)
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

    fn token() -> Address {
        Address::repeat_byte(0xcc)
    }

    fn parent(registry: &EnforcerRegistry) -> crate::UnsignedDelegation {
        Delegation::builder()
            .delegator(Address::repeat_byte(0xaa))
            .delegate(Address::repeat_byte(0xbb))
            .amount(token(), U256::from(1000))
            .expiry(Some(2000))
            .build(registry)
    }

    #[test]
    fn test_amount_narrowing_boundaries() -> anyhow::Result<()> {
        let registry = registry();
        let parent = parent(&registry);
        let validator = ScopeValidator::new(&registry);

        // Everything up to and including the parent limit is a valid narrowing.
        for amount in [0u64, 1, 999, 1000] {
            let child = ChildScope::new().with_amount(token(), U256::from(amount));
            assert!(validator.check(&parent, &child)?.is_valid());
        }

        // The smallest excess is rejected.
        let child = ChildScope::new().with_amount(token(), U256::from(1001));
        let validity = validator.check(&parent, &child)?;
        assert_eq!(validity.violations().len(), 1);
        assert!(matches!(
            validity.violations()[0],
            Violation::AmountExceedsLimit { .. }
        ));

        Ok(())
    }

    #[test]
    fn test_expiry_narrowing_boundaries() -> anyhow::Result<()> {
        let registry = registry();
        let parent = parent(&registry);
        let validator = ScopeValidator::new(&registry);

        assert!(validator
            .check(&parent, &ChildScope::new().with_expiry(2000))?
            .is_valid());
        assert!(validator
            .check(&parent, &ChildScope::new().with_expiry(1))?
            .is_valid());

        let validity = validator.check(&parent, &ChildScope::new().with_expiry(2001))?;
        assert_eq!(validity.violations().len(), 1);
        assert!(matches!(
            validity.violations()[0],
            Violation::ExpiryExceedsParent { .. }
        ));

        Ok(())
    }

    #[test]
    fn test_all_violations_reported_in_one_pass() -> anyhow::Result<()> {
        let registry = registry();
        let parent = parent(&registry);
        let validator = ScopeValidator::new(&registry);

        let child = ChildScope::new()
            .with_amount(token(), U256::from(5000))
            .with_expiry(9000);

        let validity = validator.check(&parent, &child)?;
        assert_eq!(validity.violations().len(), 2);

        Ok(())
    }

    #[test]
    fn test_cross_token_comparison_is_an_error() {
        let registry = registry();
        let parent = parent(&registry);
        let validator = ScopeValidator::new(&registry);

        let child = ChildScope::new().with_amount(Address::repeat_byte(0xdd), U256::from(1));
        assert!(matches!(
            validator.check(&parent, &child),
            Err(DelegationError::TokenMismatch { .. })
        ));
    }

    #[test]
    fn test_unconstrained_parent_passes_through() -> anyhow::Result<()> {
        let registry = registry();
        let validator = ScopeValidator::new(&registry);

        let parent = Delegation::builder()
            .delegator(Address::repeat_byte(0xaa))
            .delegate(Address::repeat_byte(0xbb))
            .no_amount_limit()
            .expiry(None)
            .build(&registry);

        let child = ChildScope::new()
            .with_amount(token(), U256::MAX)
            .with_expiry(u64::MAX);

        let validity = validator.check(&parent, &child)?;
        assert!(validity.is_valid());
        assert!(validity.is_unchecked());

        Ok(())
    }
}
