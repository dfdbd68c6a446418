use std::fmt::Display;

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One constraint attached to a delegation.
///
/// A caveat is opaque to generic code: the `enforcer` identifies which enforcement semantics
/// apply, and `terms` is a fixed-layout blob whose structure is determined entirely by the
/// enforcer's kind (see [`crate::terms`]). Enforcers this client does not recognize are
/// preserved verbatim through hashing, building, and chain assembly, and skipped by
/// client-side checks; the external verifier remains authoritative for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caveat {
    /// Identifier of the contract that enforces this constraint at redemption time.
    pub enforcer: Address,

    /// Fixed-layout binary terms; covered by the canonical hash.
    pub terms: Bytes,

    /// Runtime-supplied arguments. Never covered by the signature and ignored by current
    /// enforcement logic; must not carry security-relevant data.
    #[serde(default)]
    pub args: Bytes,
}

/// The caveat kinds this client understands.
///
/// The set of enforcers in the wild is open; this enum covers the kinds whose terms layout
/// this build can decode. Anything else is treated as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CaveatKind {
    /// Caps the native value an action may carry; zero forbids it entirely.
    ValueCeiling,
    /// Caps the cumulative token amount transferable under the delegation.
    AmountLimit,
    /// Restricts the delegation to a `[notBefore, notAfter)` time window.
    TimeWindow,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Caveat {
    /// Creates a caveat with empty runtime arguments.
    pub fn new(enforcer: Address, terms: impl Into<Bytes>) -> Self {
        Self {
            enforcer,
            terms: terms.into(),
            args: Bytes::new(),
        }
    }

    /// Attaches runtime arguments to the caveat.
    pub fn with_args(mut self, args: impl Into<Bytes>) -> Self {
        self.args = args.into();
        self
    }
}

impl CaveatKind {
    /// Returns the kind's human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            CaveatKind::ValueCeiling => "value-ceiling",
            CaveatKind::AmountLimit => "amount-limit",
            CaveatKind::TimeWindow => "time-window",
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for CaveatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
