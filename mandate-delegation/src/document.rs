use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, Bytes, B256};
use mandate_signer::RecoverableSignature;
use serde::{Deserialize, Serialize};

use crate::{
    Caveat, Delegation, DelegationError, DelegationResult, Salt, SignedDelegation,
    UnsignedDelegation,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The interchange document used to hand delegations between parties as a file.
///
/// All blobs are 0x-hex; the salt is a decimal string so its numeric value survives
/// serializers that cannot carry full-width integers. The `_meta` block is advisory: written
/// for human and tooling convenience, never hashed, never trusted — [`verify_meta`]
/// recomputes the canonical hash and compares.
///
/// [`verify_meta`]: DelegationDocument::verify_meta
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationDocument {
    /// Identity of the grantee.
    pub delegate: Address,

    /// Identity of the grantor.
    pub delegator: Address,

    /// The ROOT sentinel or the parent delegation's hash.
    pub authority: B256,

    /// Ordered caveats, order-preserving.
    pub caveats: Vec<Caveat>,

    /// The salt as a decimal string.
    pub salt: String,

    /// The delegator's signature, absent before signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Bytes>,

    /// Advisory, unhashed metadata.
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<DocumentMeta>,
}

/// The advisory metadata block of a [`DelegationDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    /// When the document was written, as seconds since the Unix epoch.
    pub created_at: u64,

    /// The canonical hash of the delegation at writing time.
    pub delegation_hash: B256,

    /// The parent's hash, for non-root delegations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<B256>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DelegationDocument {
    /// Writes a signed delegation into its document form.
    pub fn from_signed(delegation: &SignedDelegation) -> Self {
        let mut document = Self::from_fields(
            delegation,
            Some(Bytes::from(delegation.signature().to_vec())),
        );
        document.meta = Some(DocumentMeta::for_delegation(delegation));
        document
    }

    /// Writes an unsigned delegation into its document form.
    pub fn from_unsigned(delegation: &UnsignedDelegation) -> Self {
        let mut document = Self::from_fields(delegation, None);
        document.meta = Some(DocumentMeta::for_delegation(delegation));
        document
    }

    fn from_fields<S>(delegation: &Delegation<S>, signature: Option<Bytes>) -> Self {
        Self {
            delegate: *delegation.delegate(),
            delegator: *delegation.delegator(),
            authority: *delegation.authority(),
            caveats: delegation.caveats().to_vec(),
            salt: delegation.salt().to_string(),
            signature,
            meta: None,
        }
    }

    /// Restores the delegation without its signature.
    ///
    /// The salt is restored to its numeric type before any hashing, so the decimal string
    /// encoding is purely a serialization convenience.
    pub fn to_unsigned(&self) -> DelegationResult<UnsignedDelegation> {
        let salt: Salt = self.salt.parse()?;

        Ok(Delegation::from_parts(
            self.delegate,
            self.delegator,
            self.authority,
            self.caveats.clone(),
            salt,
        ))
    }

    /// Restores the signed delegation; fails if the document carries no signature.
    pub fn to_signed(&self) -> DelegationResult<SignedDelegation> {
        let signature = self
            .signature
            .as_ref()
            .ok_or(DelegationError::MissingSignature)?;
        let signature = RecoverableSignature::from_slice(signature)?;

        Ok(self.to_unsigned()?.with_signature(signature))
    }

    /// Recomputes the canonical hash from the document's hashed fields and compares it
    /// against the advisory `_meta.delegationHash`.
    pub fn verify_meta(&self) -> DelegationResult<()> {
        let Some(meta) = &self.meta else {
            return Ok(());
        };

        let computed = self.to_unsigned()?.hash();
        if meta.delegation_hash != computed {
            return Err(DelegationError::MetaHashMismatch {
                stored: meta.delegation_hash,
                computed,
            });
        }

        Ok(())
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> DelegationResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a document from JSON.
    pub fn from_json(json: &str) -> DelegationResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl DocumentMeta {
    fn for_delegation<S>(delegation: &Delegation<S>) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);

        Self {
            created_at,
            delegation_hash: delegation.hash(),
            parent_hash: (!delegation.is_root()).then(|| *delegation.authority()),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
