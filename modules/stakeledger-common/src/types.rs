//! Chain-level primitive types shared by every entity.

use std::fmt;

use alloy_primitives::{hex, FixedBytes, B256, U256};
use serde::{Deserialize, Serialize};

pub use alloy_primitives::Address;

/// Unsigned 256-bit token amount, as emitted by the staking contract.
pub type Amount = U256;

/// 32-byte transaction hash.
pub type TxHash = B256;

/// Seconds since the Unix epoch, as carried in event payloads and block headers.
pub type Timestamp = u64;

/// Account ids are the user address in lowercase, `0x`-prefixed hex.
pub fn account_id(address: &Address) -> String {
    hex::encode_prefixed(address)
}

/// Composite id of one log: the transaction hash followed by the log index
/// as 4 little-endian bytes.
///
/// Unique across the logs of one transaction, and globally unique given
/// unique transaction hashes. Stake positions and audit records both use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(FixedBytes<36>);

impl EventId {
    pub fn new(transaction_hash: TxHash, log_index: u32) -> Self {
        let mut bytes = [0u8; 36];
        bytes[..32].copy_from_slice(transaction_hash.as_slice());
        bytes[32..].copy_from_slice(&log_index.to_le_bytes());
        Self(FixedBytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 36] {
        &self.0 .0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_prefixed(self.0))
    }
}
