use std::fmt::Display;

use alloy_primitives::{Address, U256};

use crate::Timestamp;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The outcome of a validation pass: valid, or invalid with the complete violation list.
///
/// Validators collect every violation they find in one pass rather than failing on the
/// first, so a caller can present all problems at once. Invalidity is a normal return value,
/// never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validity {
    violations: Vec<Violation>,
    checked: usize,
}

/// One failed constraint check, carrying the decoded bound and the offending value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A requested or transferred amount exceeds the governing amount limit.
    AmountExceedsLimit {
        /// The decoded limit.
        limit: U256,
        /// The amount requested.
        requested: U256,
    },

    /// A child's requested expiry reaches past the parent's upper time bound.
    ExpiryExceedsParent {
        /// The parent's `notAfter` bound.
        parent_not_after: u128,
        /// The expiry the child requested.
        requested: Timestamp,
    },

    /// A transfer names a token the amount-limit caveat does not cover.
    TokenNotAuthorized {
        /// The token the delegation authorizes.
        authorized: Address,
        /// The token the transfer names.
        requested: Address,
    },

    /// The evaluation time is before the window opens.
    NotYetActive {
        /// The window's `notBefore` bound.
        not_before: u128,
        /// The evaluation time.
        now: Timestamp,
    },

    /// The evaluation time is at or past the window's end.
    Expired {
        /// The window's `notAfter` bound.
        not_after: u128,
        /// The evaluation time.
        now: Timestamp,
    },
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Validity {
    /// Creates an empty (valid, nothing checked yet) outcome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation.
    pub(crate) fn record(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Counts a caveat this client actually decoded and evaluated.
    pub(crate) fn mark_checked(&mut self) {
        self.checked += 1;
    }

    /// Folds another outcome into this one.
    pub(crate) fn merge(&mut self, other: Validity) {
        self.violations.extend(other.violations);
        self.checked += other.checked;
    }

    /// Whether no violation was found.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// The complete list of violations found.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether the pass evaluated no caveat at all.
    ///
    /// A pass-through result: valid only because there was no off-ledger information to
    /// check. Callers should surface this as a dangerous configuration.
    pub fn is_unchecked(&self) -> bool {
        self.checked == 0
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::AmountExceedsLimit { limit, requested } => {
                write!(f, "amount {requested} exceeds the limit of {limit}")
            }
            Violation::ExpiryExceedsParent {
                parent_not_after,
                requested,
            } => write!(
                f,
                "requested expiry {requested} reaches past the parent bound {parent_not_after}"
            ),
            Violation::TokenNotAuthorized {
                authorized,
                requested,
            } => write!(
                f,
                "token {requested} is not covered; the delegation authorizes {authorized}"
            ),
            Violation::NotYetActive { not_before, now } => {
                write!(f, "not yet active: window opens at {not_before}, now is {now}")
            }
            Violation::Expired { not_after, now } => {
                write!(f, "expired: window closed at {not_after}, now is {now}")
            }
        }
    }
}

impl Display for Validity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            return write!(f, "valid");
        }

        write!(f, "invalid:")?;
        for violation in &self.violations {
            write!(f, "\n  - {violation}")?;
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_collects_all_violations() {
        let mut validity = Validity::new();
        assert!(validity.is_valid());
        assert!(validity.is_unchecked());

        validity.mark_checked();
        validity.record(Violation::AmountExceedsLimit {
            limit: U256::from(40),
            requested: U256::from(50),
        });
        validity.mark_checked();
        validity.record(Violation::Expired {
            not_after: 100,
            now: 200,
        });

        assert!(!validity.is_valid());
        assert!(!validity.is_unchecked());
        assert_eq!(validity.violations().len(), 2);

        let rendered = validity.to_string();
        assert!(rendered.contains("exceeds the limit"));
        assert!(rendered.contains("expired"));
    }
}
