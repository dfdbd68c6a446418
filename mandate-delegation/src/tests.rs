//! End-to-end scenarios exercising the full build → hash → sign → validate pipeline.

use alloy_primitives::{Address, U256};
use mandate_signer::{Secp256k1Signer, SignerAddress};

use crate::{
    ChildScope, Delegation, DelegationChain, DelegationDocument, DelegationDomain,
    EnforcerRegistry, ScopeValidator, Timestamp, TransferIntent, TransferValidator, Violation,
};

//--------------------------------------------------------------------------------------------------
// Helpers
//--------------------------------------------------------------------------------------------------

const DAY: Timestamp = 24 * 3600;
const NOW: Timestamp = 1_700_000_000;

fn registry() -> EnforcerRegistry {
    EnforcerRegistry::new(
        Address::repeat_byte(0x01),
        Address::repeat_byte(0x02),
        Address::repeat_byte(0x03),
    )
}

fn domain() -> DelegationDomain {
    DelegationDomain::new(1, Address::repeat_byte(0xd1))
}

fn usdc() -> Address {
    Address::repeat_byte(0xcc)
}

/// 1000 USDC in 6-decimal minor units.
fn usdc_amount(whole: u64) -> U256 {
    U256::from(whole) * U256::from(1_000_000u64)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test]
fn test_scenario_a_root_delegation_transfer() -> anyhow::Result<()> {
    let registry = registry();
    let domain = domain();
    let alice = Secp256k1Signer::generate(&mut rand::thread_rng());
    let bob = Address::repeat_byte(0xbb);

    // Root delegation: 1000 USDC, expires in 24h.
    let delegation = Delegation::builder()
        .delegator(alice.address())
        .delegate(bob)
        .amount(usdc(), usdc_amount(1000))
        .expiry(Some(NOW + DAY))
        .sign(&registry, &alice, &domain)?;

    assert_eq!(
        delegation
            .find_caveat(crate::CaveatKind::AmountLimit, &registry)
            .map(|caveat| crate::AmountLimitTerms::decode(&caveat.terms))
            .transpose()?
            .map(|terms| terms.max_amount),
        Some(U256::from(1_000_000_000u64))
    );

    delegation.verify_signature(&domain)?;

    // A 500 USDC transfer right now is admissible with zero violations.
    let intent = TransferIntent::new(usdc(), Address::repeat_byte(0xee), usdc_amount(500));
    let validity = TransferValidator::new(&registry).check(&delegation, &intent, NOW)?;

    assert!(validity.is_valid());
    assert!(validity.violations().is_empty());

    Ok(())
}

#[test_log::test]
fn test_scenario_b_subdelegation_narrowing() -> anyhow::Result<()> {
    let registry = registry();
    let domain = domain();
    let alice = Secp256k1Signer::generate(&mut rand::thread_rng());
    let bob = Secp256k1Signer::generate(&mut rand::thread_rng());

    let parent = Delegation::builder()
        .delegator(alice.address())
        .delegate(bob.address())
        .amount(usdc(), usdc_amount(1000))
        .expiry(Some(NOW + DAY))
        .sign(&registry, &alice, &domain)?;

    let scope_validator = ScopeValidator::new(&registry);

    // 300 USDC for 12h is a valid narrowing.
    let narrowed = ChildScope::new()
        .with_amount(usdc(), usdc_amount(300))
        .with_expiry(NOW + DAY / 2);
    assert!(scope_validator.check(&parent, &narrowed)?.is_valid());

    let child = Delegation::builder()
        .delegator(bob.address())
        .delegate(Address::repeat_byte(0xdd))
        .authority(parent.hash())
        .amount(usdc(), usdc_amount(300))
        .expiry(Some(NOW + DAY / 2))
        .sign(&registry, &bob, &domain)?;

    let chain = DelegationChain::assemble(child, &[parent.clone()])?;
    assert_eq!(chain.len(), 2);
    chain.verify_signatures(&domain)?;

    // 1200 USDC exceeds the parent: exactly one violation, citing amount.
    let widened = ChildScope::new().with_amount(usdc(), usdc_amount(1200));
    let validity = scope_validator.check(&parent, &widened)?;

    assert_eq!(validity.violations().len(), 1);
    assert!(matches!(
        validity.violations()[0],
        Violation::AmountExceedsLimit { .. }
    ));

    Ok(())
}

#[test_log::test]
fn test_scenario_c_two_violations_in_one_call() -> anyhow::Result<()> {
    let registry = registry();
    let domain = domain();
    let alice = Secp256k1Signer::generate(&mut rand::thread_rng());

    // Limit of 40 minor units and a window that has already closed.
    let delegation = Delegation::builder()
        .delegator(alice.address())
        .delegate(Address::repeat_byte(0xbb))
        .amount(usdc(), U256::from(40))
        .expiry(Some(NOW - 3600))
        .sign(&registry, &alice, &domain)?;

    let intent = TransferIntent::new(usdc(), Address::repeat_byte(0xee), U256::from(50));
    let validity = TransferValidator::new(&registry).check(&delegation, &intent, NOW)?;

    assert_eq!(validity.violations().len(), 2);
    assert!(matches!(
        validity.violations()[0],
        Violation::AmountExceedsLimit {
            limit: l,
            requested: r,
        } if l == U256::from(40) && r == U256::from(50)
    ));
    assert!(matches!(validity.violations()[1], Violation::Expired { .. }));

    Ok(())
}

#[test_log::test]
fn test_document_handoff_between_parties() -> anyhow::Result<()> {
    let registry = registry();
    let domain = domain();
    let alice = Secp256k1Signer::generate(&mut rand::thread_rng());
    let bob = Secp256k1Signer::generate(&mut rand::thread_rng());

    let parent = Delegation::builder()
        .delegator(alice.address())
        .delegate(bob.address())
        .amount(usdc(), usdc_amount(1000))
        .expiry(Some(NOW + DAY))
        .sign(&registry, &alice, &domain)?;

    // Alice writes the document; Bob restores it and narrows from it.
    let json = DelegationDocument::from_signed(&parent).to_json()?;
    let restored = DelegationDocument::from_json(&json)?;
    restored.verify_meta()?;

    let parent = restored.to_signed()?;
    parent.verify_signature(&domain)?;

    let child = Delegation::builder()
        .delegator(bob.address())
        .delegate(Address::repeat_byte(0xdd))
        .authority(parent.hash())
        .amount(usdc(), usdc_amount(100))
        .expiry(Some(NOW + DAY / 4))
        .sign(&registry, &bob, &domain)?;

    let chain = DelegationChain::assemble(child, &[parent])?;

    let intent = TransferIntent::new(usdc(), Address::repeat_byte(0xee), usdc_amount(50));
    let validity = TransferValidator::new(&registry).check_chain(&chain, &intent, NOW)?;
    assert!(validity.is_valid());

    Ok(())
}
