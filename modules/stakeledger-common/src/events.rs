//! Decoded staking events: facts about balance-changing actions on chain.
//!
//! The upstream decoder hands these over already ordered by block number,
//! then log index. Nothing here validates authenticity; the emitting
//! contract is the source of truth for every running total it reports.

use serde::{Deserialize, Serialize};

use crate::types::{account_id, Address, Amount, EventId, Timestamp, TxHash};

/// A staking fact. The `type` tag names the audit table it is recorded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StakingEvent {
    Staked {
        user: Address,
        amount: Amount,
        timestamp: Timestamp,
        new_total_staked: Amount,
        current_reward_rate: Amount,
    },

    Withdrawn {
        user: Address,
        amount: Amount,
        timestamp: Timestamp,
        new_total_staked: Amount,
        current_reward_rate: Amount,
        rewards_accrued: Amount,
    },

    EmergencyWithdrawn {
        user: Address,
        amount: Amount,
        /// Principal forfeited on top of `amount`; leaves the staked balance too.
        penalty: Amount,
        timestamp: Timestamp,
        new_total_staked: Amount,
    },

    RewardsClaimed {
        user: Address,
        amount: Amount,
        timestamp: Timestamp,
        new_pending_rewards: Amount,
        total_staked: Amount,
    },
}

impl StakingEvent {
    /// The serde tag, which doubles as the audit table name.
    pub fn event_type(&self) -> &'static str {
        match self {
            StakingEvent::Staked { .. } => "staked",
            StakingEvent::Withdrawn { .. } => "withdrawn",
            StakingEvent::EmergencyWithdrawn { .. } => "emergency_withdrawn",
            StakingEvent::RewardsClaimed { .. } => "rewards_claimed",
        }
    }

    pub fn user(&self) -> &Address {
        match self {
            StakingEvent::Staked { user, .. }
            | StakingEvent::Withdrawn { user, .. }
            | StakingEvent::EmergencyWithdrawn { user, .. }
            | StakingEvent::RewardsClaimed { user, .. } => user,
        }
    }
}

/// Where a log came from on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub transaction_hash: TxHash,
    pub log_index: u32,
    pub block_number: u64,
    pub block_timestamp: Timestamp,
}

/// A decoded event together with its position in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEvent {
    #[serde(flatten)]
    pub provenance: Provenance,
    pub event: StakingEvent,
}

impl ChainEvent {
    pub fn new(provenance: Provenance, event: StakingEvent) -> Self {
        Self { provenance, event }
    }

    /// Composite id shared by the audit record and, for stakes, the position.
    pub fn id(&self) -> EventId {
        EventId::new(self.provenance.transaction_hash, self.provenance.log_index)
    }

    pub fn account_id(&self) -> String {
        account_id(self.event.user())
    }

    /// Canonical chain order: block number, then log index.
    pub fn ordering_key(&self) -> (u64, u32) {
        (self.provenance.block_number, self.provenance.log_index)
    }
}
