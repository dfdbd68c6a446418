use std::{
    collections::{HashMap, HashSet},
    sync::RwLock,
    time::{SystemTime, UNIX_EPOCH},
};

use alloy_primitives::{keccak256, B256, U256};
use async_trait::async_trait;
use mandate_delegation::{
    AmountLimitTerms, CaveatKind, DelegationDomain, EnforcerRegistry, Redemption,
    TimeWindowTerms, Timestamp, ValueCeilingTerms,
};

use crate::{LedgerClient, LedgerResult, SimulationOutcome, TxReceipt, TxStatus};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An in-memory ledger mirroring the external verifier's behavior.
///
/// Unlike the core's pure validators, this ledger keeps the accounting the authoritative
/// verifier keeps: cumulative spend per delegation hash, and the revocation set with its
/// cascade (a chain containing any revoked hash is refused). It exists so tests and dry runs
/// can observe exactly where client-side per-sibling checking and ledger-side pooled
/// accounting diverge.
#[derive(Debug)]
pub struct MemoryLedger {
    registry: EnforcerRegistry,
    domain: DelegationDomain,
    fixed_now: Option<Timestamp>,
    state: RwLock<LedgerState>,
}

#[derive(Debug, Default)]
struct LedgerState {
    revoked: HashSet<B256>,
    spent: HashMap<B256, U256>,
    submissions: u64,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MemoryLedger {
    /// Creates a ledger enforcing with the given registry and verifying context.
    pub fn new(registry: EnforcerRegistry, domain: DelegationDomain) -> Self {
        Self {
            registry,
            domain,
            fixed_now: None,
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Pins the ledger's clock, for deterministic tests.
    pub fn with_now(mut self, now: Timestamp) -> Self {
        self.fixed_now = Some(now);
        self
    }

    /// Returns the cumulative amount already redeemed under a delegation.
    pub fn spent(&self, delegation_hash: B256) -> U256 {
        self.state
            .read()
            .map(|state| {
                state
                    .spent
                    .get(&delegation_hash)
                    .copied()
                    .unwrap_or(U256::ZERO)
            })
            .unwrap_or(U256::ZERO)
    }

    fn now(&self) -> Timestamp {
        self.fixed_now.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0)
        })
    }

    /// Runs the verifier's checks over a redemption against the given state.
    ///
    /// Returns the spend to record on success, or the revert reason.
    fn enforce(
        &self,
        redemption: &Redemption,
        state: &LedgerState,
    ) -> Result<(B256, U256), String> {
        let chain = &redemption.chain;
        let leaf = chain.leaf();
        let leaf_hash = leaf.hash();

        if let Err(source) = chain.verify_signatures(&self.domain) {
            return Err(format!("signature verification failed: {source}"));
        }

        // Revocation cascades: one revoked ancestor poisons the whole chain.
        for hash in chain.hashes() {
            if state.revoked.contains(&hash) {
                return Err(format!("delegation {hash} is revoked"));
            }
        }

        let mut spend = U256::ZERO;

        for caveat in leaf.caveats() {
            match self.registry.kind_of(caveat.enforcer) {
                Some(CaveatKind::ValueCeiling) => {
                    let ceiling = ValueCeilingTerms::decode(&caveat.terms)
                        .map_err(|source| source.to_string())?;
                    if redemption.call.value > ceiling.max_value {
                        return Err(format!(
                            "native value {} exceeds ceiling {}",
                            redemption.call.value, ceiling.max_value
                        ));
                    }
                }
                Some(CaveatKind::TimeWindow) => {
                    let window = TimeWindowTerms::decode(&caveat.terms)
                        .map_err(|source| source.to_string())?;
                    if !window.contains(self.now()) {
                        return Err("outside the delegation's time window".to_string());
                    }
                }
                Some(CaveatKind::AmountLimit) => {
                    let limit = AmountLimitTerms::decode(&caveat.terms)
                        .map_err(|source| source.to_string())?;

                    let Some((token, _recipient, amount)) = redemption.call.as_erc20_transfer()
                    else {
                        return Err(
                            "amount-limit caveat requires token transfer calldata".to_string()
                        );
                    };

                    if token != limit.token {
                        return Err(format!(
                            "transfer targets {token}, caveat covers {}",
                            limit.token
                        ));
                    }

                    let already = state
                        .spent
                        .get(&leaf_hash)
                        .copied()
                        .unwrap_or(U256::ZERO);
                    if already.saturating_add(amount) > limit.max_amount {
                        return Err(format!(
                            "cumulative spend {} + {amount} exceeds limit {}",
                            already, limit.max_amount
                        ));
                    }

                    spend = amount;
                }
                None => {
                    tracing::debug!(enforcer = %caveat.enforcer, "no local enforcement for caveat");
                }
            }
        }

        Ok((leaf_hash, spend))
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn simulate(&self, redemption: &Redemption) -> LedgerResult<SimulationOutcome> {
        let state = self
            .state
            .read()
            .map_err(|_| crate::LedgerError::Transport("ledger state poisoned".to_string()))?;

        match self.enforce(redemption, &state) {
            Ok(_) => Ok(SimulationOutcome::Success),
            Err(reason) => Ok(SimulationOutcome::Revert(reason)),
        }
    }

    async fn submit(&self, redemption: &Redemption) -> LedgerResult<TxReceipt> {
        let mut state = self
            .state
            .write()
            .map_err(|_| crate::LedgerError::Transport("ledger state poisoned".to_string()))?;

        state.submissions += 1;
        let mut preimage = Vec::with_capacity(32 + 8);
        preimage.extend_from_slice(redemption.chain.leaf().hash().as_slice());
        preimage.extend_from_slice(&state.submissions.to_be_bytes());
        let tx_id = keccak256(preimage);

        match self.enforce(redemption, &state) {
            Ok((leaf_hash, spend)) => {
                let entry = state.spent.entry(leaf_hash).or_insert(U256::ZERO);
                *entry = entry.saturating_add(spend);

                tracing::debug!(%tx_id, %leaf_hash, %spend, "redemption committed");
                Ok(TxReceipt {
                    tx_id,
                    status: TxStatus::Confirmed,
                })
            }
            Err(reason) => {
                tracing::debug!(%tx_id, %reason, "redemption reverted");
                Ok(TxReceipt {
                    tx_id,
                    status: TxStatus::Reverted(reason),
                })
            }
        }
    }

    async fn is_revoked(&self, delegation_hash: B256) -> LedgerResult<bool> {
        let state = self
            .state
            .read()
            .map_err(|_| crate::LedgerError::Transport("ledger state poisoned".to_string()))?;

        Ok(state.revoked.contains(&delegation_hash))
    }

    async fn revoke(&self, delegation_hash: B256) -> LedgerResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| crate::LedgerError::Transport("ledger state poisoned".to_string()))?;

        state.revoked.insert(delegation_hash);
        tracing::debug!(%delegation_hash, "delegation revoked");
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;
    use mandate_delegation::{
        Delegation, DelegationChain, TransferIntent, TransferValidator,
    };
    use mandate_signer::{Secp256k1Signer, SignerAddress};

    use super::*;

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

    fn token() -> Address {
        Address::repeat_byte(0xcc)
    }

    fn ledger() -> MemoryLedger {
        MemoryLedger::new(registry(), domain()).with_now(NOW)
    }

    fn single_link_redemption(
        signer: &Secp256k1Signer,
        limit: u64,
        amount: u64,
    ) -> anyhow::Result<Redemption> {
        let delegation = Delegation::builder()
            .delegator(signer.address())
            .delegate(Address::repeat_byte(0xbb))
            .amount(token(), U256::from(limit))
            .expiry(Some(NOW + 3600))
            .sign(&registry(), signer, &domain())?;

        let chain = DelegationChain::verify(vec![delegation])?;
        let intent = TransferIntent::new(token(), Address::repeat_byte(0xee), U256::from(amount));
        anyhow::Ok(Redemption::for_transfer(chain, &intent))
    }

    #[test_log::test(tokio::test)]
    async fn test_simulate_and_submit_within_limit() -> anyhow::Result<()> {
        let signer = Secp256k1Signer::generate(&mut rand::thread_rng());
        let ledger = ledger();
        let redemption = single_link_redemption(&signer, 100, 60)?;

        assert!(ledger.simulate(&redemption).await?.is_success());

        let receipt = ledger.submit(&redemption).await?;
        assert_eq!(receipt.status, TxStatus::Confirmed);
        assert_eq!(
            ledger.spent(redemption.chain.leaf().hash()),
            U256::from(60)
        );

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_pooled_spend_refuses_what_per_call_checks_allow() -> anyhow::Result<()> {
        let signer = Secp256k1Signer::generate(&mut rand::thread_rng());
        let ledger = ledger();
        let redemption = single_link_redemption(&signer, 100, 60)?;

        // Off-ledger, each 60-unit transfer looks fine in isolation; the client does not
        // track spend across calls.
        let registry = registry();
        let intent = TransferIntent::new(token(), Address::repeat_byte(0xee), U256::from(60));
        let validity =
            TransferValidator::new(&registry).check(redemption.chain.leaf(), &intent, NOW)?;
        assert!(validity.is_valid());

        // The ledger pools: the second redemption exceeds the cumulative limit.
        assert_eq!(
            ledger.submit(&redemption).await?.status,
            TxStatus::Confirmed
        );
        let receipt = ledger.submit(&redemption).await?;
        assert!(matches!(receipt.status, TxStatus::Reverted(_)));

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_revoking_a_parent_poisons_descendants() -> anyhow::Result<()> {
        let registry = registry();
        let domain = domain();
        let alice = Secp256k1Signer::generate(&mut rand::thread_rng());
        let bob = Secp256k1Signer::generate(&mut rand::thread_rng());

        let root = Delegation::builder()
            .delegator(alice.address())
            .delegate(bob.address())
            .amount(token(), U256::from(1000))
            .expiry(Some(NOW + 3600))
            .sign(&registry, &alice, &domain)?;

        let leaf = Delegation::builder()
            .delegator(bob.address())
            .delegate(Address::repeat_byte(0xdd))
            .authority(root.hash())
            .amount(token(), U256::from(100))
            .expiry(Some(NOW + 1800))
            .sign(&registry, &bob, &domain)?;

        let chain = DelegationChain::assemble(leaf, &[root.clone()])?;
        let intent = TransferIntent::new(token(), Address::repeat_byte(0xee), U256::from(10));
        let redemption = Redemption::for_transfer(chain, &intent);

        let ledger = ledger();
        assert!(ledger.simulate(&redemption).await?.is_success());

        ledger.revoke(root.hash()).await?;
        assert!(ledger.is_revoked(root.hash()).await?);

        let outcome = ledger.simulate(&redemption).await?;
        assert!(outcome.revert_reason().is_some_and(|r| r.contains("revoked")));

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_time_window_enforced_at_redemption() -> anyhow::Result<()> {
        let signer = Secp256k1Signer::generate(&mut rand::thread_rng());
        let redemption = single_link_redemption(&signer, 100, 10)?;

        // Same redemption, evaluated after the window closed.
        let late_ledger = MemoryLedger::new(registry(), domain()).with_now(NOW + 7200);
        let outcome = late_ledger.simulate(&redemption).await?;
        assert!(outcome
            .revert_reason()
            .is_some_and(|r| r.contains("time window")));

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_value_ceiling_enforced_at_redemption() -> anyhow::Result<()> {
        let signer = Secp256k1Signer::generate(&mut rand::thread_rng());
        let mut redemption = single_link_redemption(&signer, 100, 10)?;

        // Token-only semantics: the builder's default zero ceiling refuses native value.
        redemption.call.value = U256::from(1);

        let outcome = ledger().simulate(&redemption).await?;
        assert!(outcome
            .revert_reason()
            .is_some_and(|r| r.contains("ceiling")));

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_tampered_signature_reverts() -> anyhow::Result<()> {
        let signer = Secp256k1Signer::generate(&mut rand::thread_rng());
        let stranger = Secp256k1Signer::generate(&mut rand::thread_rng());
        let redemption = single_link_redemption(&signer, 100, 10)?;

        // Re-sign the leaf with a stranger's key and graft it into the redemption.
        let leaf = redemption.chain.leaf().clone();
        let digest = leaf.signing_digest(&domain());
        let forged = leaf
            .into_unsigned()
            .with_signature(mandate_signer::SignDigest::sign_digest(&stranger, &digest)?);

        let forged_chain = DelegationChain::verify(vec![forged])?;
        let intent = TransferIntent::new(token(), Address::repeat_byte(0xee), U256::from(10));
        let forged_redemption = Redemption::for_transfer(forged_chain, &intent);

        let outcome = ledger().simulate(&forged_redemption).await?;
        assert!(outcome
            .revert_reason()
            .is_some_and(|r| r.contains("signature")));

        Ok(())
    }
}
