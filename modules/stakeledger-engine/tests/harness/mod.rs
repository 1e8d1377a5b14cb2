//! Shared builders for dispatcher tests.
//!
//! `SimContract` plays the role of the staking contract: it keeps its own
//! balances and emits events whose running totals are consistent with them,
//! the way the real contract would.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use stakeledger_common::{
    tables, Account, Address, Amount, ChainEvent, LedgerSettings, ProtocolAggregate, Provenance,
    StakingEvent, TxHash, PROTOCOL_ID,
};
use stakeledger_engine::Dispatcher;
use stakeledger_store::{EntityStore, MemoryEntityStore};

pub fn user(n: u8) -> Address {
    Address::repeat_byte(n)
}

/// A user address no other test run shares: `salt` fills the low 8 bytes.
pub fn salted_user(n: u8, salt: u64) -> Address {
    let mut bytes = [n; 20];
    bytes[12..].copy_from_slice(&salt.to_be_bytes());
    Address::from(bytes)
}

pub fn amount(n: u64) -> Amount {
    Amount::from(n)
}

pub fn memory_dispatcher() -> (Arc<MemoryEntityStore>, Dispatcher<Arc<MemoryEntityStore>>) {
    let store = Arc::new(MemoryEntityStore::new());
    let dispatcher = Dispatcher::new(store.clone(), LedgerSettings::default());
    (store, dispatcher)
}

pub async fn load_account(store: &MemoryEntityStore, address: &Address) -> Option<Account> {
    let id = stakeledger_common::account_id(address);
    store
        .load(tables::ACCOUNT, &id)
        .await
        .unwrap()
        .map(|v| serde_json::from_value(v).unwrap())
}

pub async fn load_protocol(store: &MemoryEntityStore) -> Option<ProtocolAggregate> {
    store
        .load(tables::PROTOCOL, PROTOCOL_ID)
        .await
        .unwrap()
        .map(|v| serde_json::from_value(v).unwrap())
}

pub fn audit_count(store: &MemoryEntityStore) -> usize {
    tables::AUDIT.iter().map(|t| store.count(t)).sum()
}

/// Wraps events with provenance: one transaction per block, log indexes
/// counting up within it.
pub struct ChainBuilder {
    block_number: u64,
    block_timestamp: u64,
    log_index: u32,
    salt: u64,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::salted(0)
    }

    /// Transaction hashes carry `salt` after the block number, so builders
    /// with different salts never produce the same event id.
    pub fn salted(salt: u64) -> Self {
        Self {
            block_number: 1,
            block_timestamp: 1000,
            log_index: 0,
            salt,
        }
    }

    pub fn next_block(&mut self) {
        self.block_number += 1;
        self.block_timestamp += 12;
        self.log_index = 0;
    }

    pub fn wrap(&mut self, event: StakingEvent) -> ChainEvent {
        let mut hash = [0u8; 32];
        hash[..8].copy_from_slice(&self.block_number.to_be_bytes());
        hash[8..16].copy_from_slice(&self.salt.to_be_bytes());
        let provenance = Provenance {
            transaction_hash: TxHash::from(hash),
            log_index: self.log_index,
            block_number: self.block_number,
            block_timestamp: self.block_timestamp,
        };
        self.log_index += 1;
        ChainEvent::new(provenance, event)
    }
}

/// Minimal staking contract model producing self-consistent events.
pub struct SimContract {
    pub balances: BTreeMap<Address, u64>,
    pub pending: BTreeMap<Address, u64>,
    pub total_staked: u64,
    pub reward_rate: u64,
    rng: u64,
}

impl SimContract {
    pub fn new(seed: u64) -> Self {
        Self {
            balances: BTreeMap::new(),
            pending: BTreeMap::new(),
            total_staked: 0,
            reward_rate: 5,
            rng: seed.wrapping_mul(6364136223846793005).wrapping_add(1),
        }
    }

    fn next(&mut self, bound: u64) -> u64 {
        // LCG; deterministic per seed.
        self.rng = self.rng.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.rng >> 33) % bound
    }

    /// One plausible event for a random user.
    pub fn step(&mut self, timestamp: u64) -> StakingEvent {
        let who = user(1 + self.next(3) as u8);
        let balance = *self.balances.get(&who).unwrap_or(&0);
        let choice = if balance == 0 { 0 } else { self.next(4) };

        match choice {
            1 => {
                let withdraw = 1 + self.next(balance);
                let accrued = self.next(4);
                self.balances.insert(who, balance - withdraw);
                self.total_staked -= withdraw;
                *self.pending.entry(who).or_default() += accrued;
                StakingEvent::Withdrawn {
                    user: who,
                    amount: amount(withdraw),
                    timestamp,
                    new_total_staked: amount(self.total_staked),
                    current_reward_rate: amount(self.reward_rate),
                    rewards_accrued: amount(accrued),
                }
            }
            2 => {
                let penalty = self.next(balance / 4 + 1);
                let withdraw = self.next(balance - penalty + 1);
                self.balances.insert(who, balance - withdraw - penalty);
                self.total_staked -= withdraw + penalty;
                StakingEvent::EmergencyWithdrawn {
                    user: who,
                    amount: amount(withdraw),
                    penalty: amount(penalty),
                    timestamp,
                    new_total_staked: amount(self.total_staked),
                }
            }
            3 => {
                let claimable = *self.pending.get(&who).unwrap_or(&0);
                let claimed = self.next(claimable + 1);
                self.pending.insert(who, claimable - claimed);
                StakingEvent::RewardsClaimed {
                    user: who,
                    amount: amount(claimed),
                    timestamp,
                    new_pending_rewards: amount(claimable - claimed),
                    total_staked: amount(self.total_staked),
                }
            }
            _ => {
                let stake = 1 + self.next(500);
                self.balances.insert(who, balance + stake);
                self.total_staked += stake;
                self.reward_rate = 1 + self.next(10);
                StakingEvent::Staked {
                    user: who,
                    amount: amount(stake),
                    timestamp,
                    new_total_staked: amount(self.total_staked),
                    current_reward_rate: amount(self.reward_rate),
                }
            }
        }
    }
}

/// A deterministic, self-consistent stream of `len` events.
pub fn simulated_stream(seed: u64, len: usize) -> Vec<ChainEvent> {
    salted_stream(seed, len, 0)
}

/// `simulated_stream` with event ids built by `ChainBuilder::salted(salt)`.
pub fn salted_stream(seed: u64, len: usize, salt: u64) -> Vec<ChainEvent> {
    let mut contract = SimContract::new(seed);
    let mut chain = ChainBuilder::salted(salt);
    let mut events = Vec::with_capacity(len);

    for i in 0..len {
        if i % 3 == 0 {
            chain.next_block();
        }
        let timestamp = chain.block_timestamp;
        events.push(chain.wrap(contract.step(timestamp)));
    }
    events
}
