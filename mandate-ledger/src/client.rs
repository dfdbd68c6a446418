use alloy_primitives::B256;
use async_trait::async_trait;
use mandate_delegation::Redemption;

use crate::LedgerResult;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of simulating a redemption without committing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationOutcome {
    /// The redemption would execute.
    Success,

    /// The redemption would revert, with the verifier's reason.
    Revert(String),
}

/// The result of submitting a redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Identifier of the submitted transaction.
    pub tx_id: B256,

    /// Eventual execution status.
    pub status: TxStatus,
}

/// Terminal status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// The redemption executed and its state changes are committed.
    Confirmed,

    /// The redemption reverted on the ledger, with the verifier's reason.
    Reverted(String),
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// The seam to an external ledger holding the authoritative verifier.
///
/// Calls are one-shot request/response; retry policy, timeouts, and cancellation belong to
/// implementations, never to the core. The core's validators remain pure — nothing here is
/// consulted during off-ledger validation.
#[async_trait]
pub trait LedgerClient {
    /// Simulates the redemption and reports the outcome without committing state.
    async fn simulate(&self, redemption: &Redemption) -> LedgerResult<SimulationOutcome>;

    /// Submits the redemption and returns its transaction identifier and eventual status.
    async fn submit(&self, redemption: &Redemption) -> LedgerResult<TxReceipt>;

    /// Whether the delegation identified by this hash is currently revoked.
    async fn is_revoked(&self, delegation_hash: B256) -> LedgerResult<bool>;

    /// Records a revocation for the delegation identified by this hash.
    ///
    /// Revocation cascades: the verifier refuses any chain containing a revoked hash, so
    /// revoking a parent invalidates every descendant without further bookkeeping.
    async fn revoke(&self, delegation_hash: B256) -> LedgerResult<()>;
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SimulationOutcome {
    /// Whether the simulation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, SimulationOutcome::Success)
    }

    /// The revert reason, if any.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            SimulationOutcome::Success => None,
            SimulationOutcome::Revert(reason) => Some(reason),
        }
    }
}
