//! Persisted entities. Accounts and the protocol aggregate are mutable
//! running state; positions and audit records are written once.

use serde::{Deserialize, Serialize};
use stakeledger_store::Entity;

use crate::error::LedgerError;
use crate::events::{ChainEvent, StakingEvent};
use crate::types::{Amount, EventId, Timestamp, TxHash};

/// Logical table names.
pub mod tables {
    pub const ACCOUNT: &str = "account";
    pub const PROTOCOL: &str = "protocol";
    pub const STAKE_POSITION: &str = "stake_position";
    pub const STAKED: &str = "staked";
    pub const WITHDRAWN: &str = "withdrawn";
    pub const EMERGENCY_WITHDRAWN: &str = "emergency_withdrawn";
    pub const REWARDS_CLAIMED: &str = "rewards_claimed";

    /// The four audit tables, one per event kind.
    pub const AUDIT: [&str; 4] = [STAKED, WITHDRAWN, EMERGENCY_WITHDRAWN, REWARDS_CLAIMED];
}

/// Id of the protocol singleton.
pub const PROTOCOL_ID: &str = "1";

/// Lock window applied to new positions unless the protocol row says otherwise.
pub const DEFAULT_MIN_LOCK_DURATION: u64 = 86_400;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub staked_amount: Amount,
    pub pending_rewards: Amount,
    pub last_stake_timestamp: Timestamp,
}

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            staked_amount: Amount::ZERO,
            pending_rewards: Amount::ZERO,
            last_stake_timestamp: 0,
        }
    }

    pub fn credit_stake(&mut self, amount: Amount, timestamp: Timestamp) -> Result<(), LedgerError> {
        self.staked_amount = self
            .staked_amount
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { field: "account.staked_amount" })?;
        self.last_stake_timestamp = timestamp;
        Ok(())
    }

    /// Remove principal. Underflow is a data-integrity error, never clamped.
    pub fn debit_stake(&mut self, debit: Amount) -> Result<(), LedgerError> {
        self.staked_amount = self.staked_amount.checked_sub(debit).ok_or_else(|| {
            LedgerError::NegativeBalance {
                account: self.id.clone(),
                staked: self.staked_amount,
                debit,
            }
        })?;
        Ok(())
    }
}

impl Entity for Account {
    fn table(&self) -> &'static str {
        tables::ACCOUNT
    }

    fn entity_id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// ProtocolAggregate
// ---------------------------------------------------------------------------

/// Global totals mirrored from the staking contract, plus lock policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolAggregate {
    pub id: String,
    pub total_staked: Amount,
    pub current_reward_rate: Amount,
    pub total_rewards_distributed: Amount,
    pub min_lock_duration: u64,
}

impl ProtocolAggregate {
    pub fn new(min_lock_duration: u64) -> Self {
        Self {
            id: PROTOCOL_ID.to_string(),
            total_staked: Amount::ZERO,
            current_reward_rate: Amount::ZERO,
            total_rewards_distributed: Amount::ZERO,
            min_lock_duration,
        }
    }

    pub fn add_rewards_distributed(&mut self, amount: Amount) -> Result<(), LedgerError> {
        self.total_rewards_distributed = self
            .total_rewards_distributed
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { field: "protocol.total_rewards_distributed" })?;
        Ok(())
    }

    /// When a stake made at `timestamp` may be withdrawn without penalty.
    pub fn unlock_time(&self, timestamp: Timestamp) -> Result<Timestamp, LedgerError> {
        timestamp
            .checked_add(self.min_lock_duration)
            .ok_or(LedgerError::Overflow { field: "stake_position.unlock_time" })
    }
}

impl Entity for ProtocolAggregate {
    fn table(&self) -> &'static str {
        tables::PROTOCOL
    }

    fn entity_id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// StakePosition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Active,
    Withdrawn,
    EmergencyWithdrawn,
}

/// Terms of one stake and the protocol state right after it was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    pub id: String,
    pub account: String,
    pub amount: Amount,
    pub timestamp: Timestamp,
    pub unlock_time: Timestamp,
    pub total_staked: Amount,
    pub current_reward_rate: Amount,
    pub transaction_hash: TxHash,
    pub status: PositionStatus,
    pub block_number: u64,
    pub block_timestamp: Timestamp,
}

impl Entity for StakePosition {
    fn table(&self) -> &'static str {
        tables::STAKE_POSITION
    }

    fn entity_id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// AuditRecord
// ---------------------------------------------------------------------------

/// Write-once copy of one processed event and where it came from.
///
/// Stored in the table named after the event kind, under the composite id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    pub account: String,
    pub event: StakingEvent,
    pub transaction_hash: TxHash,
    pub log_index: u32,
    pub block_number: u64,
    pub block_timestamp: Timestamp,
}

impl AuditRecord {
    pub fn from_chain_event(event: &ChainEvent) -> Self {
        Self {
            id: event.id().to_string(),
            account: event.account_id(),
            event: event.event.clone(),
            transaction_hash: event.provenance.transaction_hash,
            log_index: event.provenance.log_index,
            block_number: event.provenance.block_number,
            block_timestamp: event.provenance.block_timestamp,
        }
    }

    pub fn event_id(&self) -> EventId {
        EventId::new(self.transaction_hash, self.log_index)
    }
}

impl Entity for AuditRecord {
    fn table(&self) -> &'static str {
        self.event.event_type()
    }

    fn entity_id(&self) -> &str {
        &self.id
    }
}
