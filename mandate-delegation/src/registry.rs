use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::CaveatKind;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The mapping from caveat kinds to the enforcement-contract identifiers deployed on a given
/// network.
///
/// This is injected, immutable configuration: one value per network and contract version,
/// passed into builders and validators at construction. Nothing here is ambient or mutable,
/// so two registries for two networks can coexist in one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcerRegistry {
    /// Enforcer for value-ceiling caveats.
    pub value_ceiling: Address,

    /// Enforcer for amount-limit caveats.
    pub amount_limit: Address,

    /// Enforcer for time-window caveats.
    pub time_window: Address,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EnforcerRegistry {
    /// Creates a registry from the three enforcer identifiers.
    pub fn new(value_ceiling: Address, amount_limit: Address, time_window: Address) -> Self {
        Self {
            value_ceiling,
            amount_limit,
            time_window,
        }
    }

    /// Returns the enforcer identifier for a known caveat kind.
    pub fn enforcer(&self, kind: CaveatKind) -> Address {
        match kind {
            CaveatKind::ValueCeiling => self.value_ceiling,
            CaveatKind::AmountLimit => self.amount_limit,
            CaveatKind::TimeWindow => self.time_window,
        }
    }

    /// Returns the caveat kind a given enforcer implements, or `None` for enforcers this
    /// client does not recognize.
    pub fn kind_of(&self, enforcer: Address) -> Option<CaveatKind> {
        if enforcer == self.value_ceiling {
            Some(CaveatKind::ValueCeiling)
        } else if enforcer == self.amount_limit {
            Some(CaveatKind::AmountLimit)
        } else if enforcer == self.time_window {
            Some(CaveatKind::TimeWindow)
        } else {
            None
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
