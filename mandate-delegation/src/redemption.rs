use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use lazy_static::lazy_static;

use crate::{DelegationChain, TransferIntent};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

lazy_static! {
    static ref ERC20_TRANSFER_SELECTOR: [u8; 4] = {
        let digest = keccak256(b"transfer(address,uint256)");
        [digest[0], digest[1], digest[2], digest[3]]
    };
}

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How the execution surface should run the redeemed call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One call, reverting the whole redemption on failure.
    #[default]
    SingleDefault,
}

/// The action a delegation chain is redeemed for: a call to `target` carrying `value` native
/// units and `calldata`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCall {
    /// The contract to call.
    pub target: Address,

    /// Native value attached to the call.
    pub value: U256,

    /// The call payload.
    pub calldata: Bytes,
}

/// A verified chain plus the action to execute under it — the unit the ledger client
/// simulates or submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    /// The assembled, integrity-checked chain, leaf to root.
    pub chain: DelegationChain,

    /// The execution-mode tag.
    pub mode: ExecutionMode,

    /// The target call.
    pub call: TargetCall,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ExecutionMode {
    /// Returns the 32-byte tag the execution surface dispatches on.
    pub fn tag(&self) -> B256 {
        match self {
            ExecutionMode::SingleDefault => B256::ZERO,
        }
    }
}

impl TargetCall {
    /// Builds the call for a token transfer: zero native value, standard `transfer` calldata.
    pub fn erc20_transfer(token: Address, recipient: Address, amount: U256) -> Self {
        let mut calldata = Vec::with_capacity(4 + 2 * 32);
        calldata.extend_from_slice(&*ERC20_TRANSFER_SELECTOR);
        calldata.extend_from_slice(B256::left_padding_from(recipient.as_slice()).as_slice());
        calldata.extend_from_slice(&amount.to_be_bytes::<32>());

        Self {
            target: token,
            value: U256::ZERO,
            calldata: calldata.into(),
        }
    }

    /// Encodes the call into the packed `(target, nativeValue, callData)` payload the
    /// execution surface consumes.
    pub fn encode(&self) -> Bytes {
        let mut buf = Vec::with_capacity(20 + 32 + self.calldata.len());
        buf.extend_from_slice(self.target.as_slice());
        buf.extend_from_slice(&self.value.to_be_bytes::<32>());
        buf.extend_from_slice(&self.calldata);
        buf.into()
    }

    /// Interprets the call as a token transfer, returning `(token, recipient, amount)`.
    ///
    /// Returns `None` for any other call shape.
    pub fn as_erc20_transfer(&self) -> Option<(Address, Address, U256)> {
        if self.calldata.len() != 4 + 2 * 32 || self.calldata[..4] != *ERC20_TRANSFER_SELECTOR {
            return None;
        }

        let recipient = Address::from_slice(&self.calldata[16..36]);
        let amount = U256::from_be_slice(&self.calldata[36..68]);
        Some((self.target, recipient, amount))
    }
}

impl Redemption {
    /// Creates a redemption in the default execution mode.
    pub fn new(chain: DelegationChain, call: TargetCall) -> Self {
        Self {
            chain,
            mode: ExecutionMode::default(),
            call,
        }
    }

    /// Creates the redemption for a token transfer under the chain.
    pub fn for_transfer(chain: DelegationChain, intent: &TransferIntent) -> Self {
        Self::new(
            chain,
            TargetCall::erc20_transfer(intent.token, intent.recipient, intent.amount),
        )
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
