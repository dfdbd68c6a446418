//! CLI configuration: which network, which verifier, which enforcers.

use std::{fs, path::Path};

use alloy_primitives::address;
use mandate_delegation::{DelegationDomain, EnforcerRegistry};
use serde::{Deserialize, Serialize};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The injected configuration every command runs against: the verifying context for
/// signatures and the enforcer registry for caveat interpretation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// The domain-separation descriptor delegations are signed under.
    pub domain: DelegationDomain,

    /// The enforcer identifiers deployed on the configured network.
    pub registry: EnforcerRegistry,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl CliConfig {
    /// Loads configuration from a JSON file, or falls back to the local development network.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path)?;
                Ok(serde_json::from_str(&raw)?)
            }
            None => Ok(Self::dev()),
        }
    }

    /// Configuration for a local development network.
    pub fn dev() -> Self {
        Self {
            domain: DelegationDomain::new(
                31337,
                address!("00000000000000000000000000000000000d717e"),
            ),
            registry: EnforcerRegistry::new(
                address!("0000000000000000000000000000000000e7c001"),
                address!("0000000000000000000000000000000000e7c002"),
                address!("0000000000000000000000000000000000e7c003"),
            ),
        }
    }
}
