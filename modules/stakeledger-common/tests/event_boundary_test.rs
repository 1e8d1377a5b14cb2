//! Event boundary tests.
//!
//! These pin the contract between decoded events and the ledger:
//! - Every event kind maps onto exactly one audit table
//! - The wire shape of a `ChainEvent` (what the replay feed carries)
//! - Audit records preserve the event verbatim

use serde_json::json;
use stakeledger_common::{
    tables, Address, Amount, AuditRecord, ChainEvent, Provenance, StakingEvent, TxHash,
};
use stakeledger_store::Entity;

fn user() -> Address {
    Address::repeat_byte(0x0a)
}

fn all_events() -> Vec<StakingEvent> {
    vec![
        StakingEvent::Staked {
            user: user(),
            amount: Amount::from(100u64),
            timestamp: 1000,
            new_total_staked: Amount::from(100u64),
            current_reward_rate: Amount::from(5u64),
        },
        StakingEvent::Withdrawn {
            user: user(),
            amount: Amount::from(40u64),
            timestamp: 2000,
            new_total_staked: Amount::from(60u64),
            current_reward_rate: Amount::from(5u64),
            rewards_accrued: Amount::from(3u64),
        },
        StakingEvent::EmergencyWithdrawn {
            user: user(),
            amount: Amount::from(20u64),
            penalty: Amount::from(5u64),
            timestamp: 3000,
            new_total_staked: Amount::from(35u64),
        },
        StakingEvent::RewardsClaimed {
            user: user(),
            amount: Amount::from(3u64),
            timestamp: 4000,
            new_pending_rewards: Amount::ZERO,
            total_staked: Amount::from(35u64),
        },
    ]
}

#[test]
fn every_event_kind_has_its_own_audit_table() {
    let types: Vec<&str> = all_events().iter().map(|e| e.event_type()).collect();
    assert_eq!(types, tables::AUDIT.to_vec());
}

#[test]
fn chain_event_deserializes_from_feed_line() {
    let line = json!({
        "transaction_hash": format!("0x{}", "11".repeat(32)),
        "log_index": 2,
        "block_number": 17,
        "block_timestamp": 1000,
        "event": {
            "type": "emergency_withdrawn",
            "user": format!("0x{}", "0a".repeat(20)),
            "amount": "0x14",
            "penalty": "0x5",
            "timestamp": 1000,
            "new_total_staked": "0x23"
        }
    });

    let event: ChainEvent = serde_json::from_value(line).unwrap();
    assert_eq!(event.provenance.transaction_hash, TxHash::repeat_byte(0x11));
    assert_eq!(event.ordering_key(), (17, 2));
    assert_eq!(
        event.event,
        StakingEvent::EmergencyWithdrawn {
            user: user(),
            amount: Amount::from(20u64),
            penalty: Amount::from(5u64),
            timestamp: 1000,
            new_total_staked: Amount::from(35u64),
        }
    );
}

#[test]
fn unknown_event_kind_is_rejected_at_the_boundary() {
    let payload = json!({"type": "slashed", "user": format!("0x{}", "0a".repeat(20))});
    assert!(serde_json::from_value::<StakingEvent>(payload).is_err());
}

#[test]
fn audit_record_copies_event_and_provenance() {
    for (i, event) in all_events().into_iter().enumerate() {
        let chain_event = ChainEvent::new(
            Provenance {
                transaction_hash: TxHash::repeat_byte(0x22),
                log_index: i as u32,
                block_number: 10 + i as u64,
                block_timestamp: 500,
            },
            event.clone(),
        );

        let record = AuditRecord::from_chain_event(&chain_event);
        assert_eq!(record.event, event);
        assert_eq!(record.id, chain_event.id().to_string());
        assert_eq!(record.event_id(), chain_event.id());
        assert_eq!(record.account, format!("0x{}", "0a".repeat(20)));
        assert_eq!(record.block_number, 10 + i as u64);
        assert_eq!(record.table(), event.event_type());
    }
}
