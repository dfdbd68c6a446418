use alloy_primitives::{Address, Bytes, U256};

use crate::{DelegationError, DelegationResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Exact terms length for an amount-limit caveat: 20-byte token, 32-byte max amount.
pub const AMOUNT_LIMIT_TERMS_LENGTH: usize = 52;

/// Exact terms length for a time-window caveat: two 16-byte timestamps.
pub const TIME_WINDOW_TERMS_LENGTH: usize = 32;

/// Exact terms length for a value-ceiling caveat: one 32-byte max value.
pub const VALUE_CEILING_TERMS_LENGTH: usize = 32;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A point in time as seconds since the Unix epoch.
pub type Timestamp = u64;

/// Decoded terms of an amount-limit caveat.
///
/// Layout: token address (20 bytes) followed by the maximum cumulative transfer amount as a
/// big-endian 256-bit unsigned integer (32 bytes), in the token's minor unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountLimitTerms {
    /// The token the limit applies to.
    pub token: Address,

    /// The maximum cumulative amount transferable under the delegation.
    pub max_amount: U256,
}

/// Decoded terms of a time-window caveat.
///
/// Layout: `notBefore` and `notAfter` as big-endian 128-bit unsigned integers (16 bytes
/// each). A zero bound means that side of the window is unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowTerms {
    /// Earliest admissible timestamp; zero means no lower bound.
    pub not_before: u128,

    /// Timestamp at and after which the delegation is no longer admissible; zero means no
    /// upper bound.
    pub not_after: u128,
}

/// Decoded terms of a value-ceiling caveat.
///
/// Layout: the maximum native value the action may carry, as a big-endian 256-bit unsigned
/// integer (32 bytes). Zero forbids native value entirely, forcing token-only semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueCeilingTerms {
    /// The maximum native value the action may carry.
    pub max_value: U256,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl AmountLimitTerms {
    /// Creates amount-limit terms.
    pub fn new(token: Address, max_amount: U256) -> Self {
        Self { token, max_amount }
    }

    /// Encodes the terms into their fixed 52-byte layout.
    pub fn encode(&self) -> Bytes {
        let mut buf = Vec::with_capacity(AMOUNT_LIMIT_TERMS_LENGTH);
        buf.extend_from_slice(self.token.as_slice());
        buf.extend_from_slice(&self.max_amount.to_be_bytes::<32>());
        buf.into()
    }

    /// Decodes terms from their fixed layout, rejecting any other length.
    pub fn decode(terms: &[u8]) -> DelegationResult<Self> {
        expect_length("amount-limit", AMOUNT_LIMIT_TERMS_LENGTH, terms)?;
        Ok(Self {
            token: Address::from_slice(&terms[..20]),
            max_amount: U256::from_be_slice(&terms[20..]),
        })
    }
}

impl TimeWindowTerms {
    /// Creates time-window terms from optional bounds; an absent bound encodes as zero.
    pub fn new(not_before: Option<Timestamp>, not_after: Option<Timestamp>) -> Self {
        Self {
            not_before: not_before.map(u128::from).unwrap_or(0),
            not_after: not_after.map(u128::from).unwrap_or(0),
        }
    }

    /// Encodes the terms into their fixed 32-byte layout.
    pub fn encode(&self) -> Bytes {
        let mut buf = Vec::with_capacity(TIME_WINDOW_TERMS_LENGTH);
        buf.extend_from_slice(&self.not_before.to_be_bytes());
        buf.extend_from_slice(&self.not_after.to_be_bytes());
        buf.into()
    }

    /// Decodes terms from their fixed layout, rejecting any other length.
    pub fn decode(terms: &[u8]) -> DelegationResult<Self> {
        expect_length("time-window", TIME_WINDOW_TERMS_LENGTH, terms)?;

        let mut not_before = [0u8; 16];
        let mut not_after = [0u8; 16];
        not_before.copy_from_slice(&terms[..16]);
        not_after.copy_from_slice(&terms[16..]);

        Ok(Self {
            not_before: u128::from_be_bytes(not_before),
            not_after: u128::from_be_bytes(not_after),
        })
    }

    /// Whether `now` falls inside the window.
    ///
    /// A timestamp is within the window iff (`notBefore == 0` or `now >= notBefore`) and
    /// (`notAfter == 0` or `now < notAfter`).
    pub fn contains(&self, now: Timestamp) -> bool {
        let now = u128::from(now);
        (self.not_before == 0 || now >= self.not_before)
            && (self.not_after == 0 || now < self.not_after)
    }
}

impl ValueCeilingTerms {
    /// Creates value-ceiling terms.
    pub fn new(max_value: U256) -> Self {
        Self { max_value }
    }

    /// The ceiling that forbids native value entirely.
    pub fn zero() -> Self {
        Self {
            max_value: U256::ZERO,
        }
    }

    /// Encodes the terms into their fixed 32-byte layout.
    pub fn encode(&self) -> Bytes {
        Bytes::from(self.max_value.to_be_bytes::<32>().to_vec())
    }

    /// Decodes terms from their fixed layout, rejecting any other length.
    pub fn decode(terms: &[u8]) -> DelegationResult<Self> {
        expect_length("value-ceiling", VALUE_CEILING_TERMS_LENGTH, terms)?;
        Ok(Self {
            max_value: U256::from_be_slice(terms),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn expect_length(kind: &'static str, expected: usize, terms: &[u8]) -> DelegationResult<()> {
    if terms.len() != expected {
        return Err(DelegationError::TermsLength {
            kind,
            expected,
            found: terms.len(),
        });
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
