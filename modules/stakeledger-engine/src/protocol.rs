//! Protocol aggregate: global totals mirrored from the staking contract.
//!
//! `total_staked` and `current_reward_rate` are overwritten with the values
//! the contract reports and never recomputed here. The contract is the
//! authority for its own running totals.
//! `total_rewards_distributed` is the one accumulator.

use stakeledger_common::{
    tables, Amount, LedgerError, LedgerSettings, ProtocolAggregate, PROTOCOL_ID,
};
use stakeledger_store::{UnitOfWork, Upsert};
use tracing::debug;

use crate::persist;

/// Load the singleton, creating it with the configured lock window on first use.
pub async fn get_or_create(
    uow: &mut UnitOfWork<'_>,
    settings: &LedgerSettings,
) -> Result<Upsert<ProtocolAggregate>, LedgerError> {
    let protocol = uow
        .upsert_with(tables::PROTOCOL, PROTOCOL_ID, || {
            ProtocolAggregate::new(settings.default_min_lock_duration)
        })
        .await
        .map_err(LedgerError::store)?;

    if protocol.was_created() {
        debug!(
            min_lock_duration = settings.default_min_lock_duration,
            "Protocol aggregate created"
        );
    }
    Ok(protocol)
}

pub fn record_stake(
    uow: &mut UnitOfWork<'_>,
    protocol: &mut ProtocolAggregate,
    new_total_staked: Amount,
    new_reward_rate: Amount,
) -> Result<(), LedgerError> {
    protocol.total_staked = new_total_staked;
    protocol.current_reward_rate = new_reward_rate;
    persist(uow, protocol)
}

pub fn record_withdraw(
    uow: &mut UnitOfWork<'_>,
    protocol: &mut ProtocolAggregate,
    new_total_staked: Amount,
    new_reward_rate: Amount,
    rewards_accrued: Amount,
) -> Result<(), LedgerError> {
    protocol.add_rewards_distributed(rewards_accrued)?;
    protocol.total_staked = new_total_staked;
    protocol.current_reward_rate = new_reward_rate;
    persist(uow, protocol)
}

pub fn record_emergency_withdraw(
    uow: &mut UnitOfWork<'_>,
    protocol: &mut ProtocolAggregate,
    new_total_staked: Amount,
) -> Result<(), LedgerError> {
    protocol.total_staked = new_total_staked;
    persist(uow, protocol)
}

pub fn record_rewards_claimed(
    uow: &mut UnitOfWork<'_>,
    protocol: &mut ProtocolAggregate,
    amount_claimed: Amount,
) -> Result<(), LedgerError> {
    protocol.add_rewards_distributed(amount_claimed)?;
    persist(uow, protocol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakeledger_store::MemoryEntityStore;

    #[tokio::test]
    async fn first_creation_uses_configured_lock_window() {
        let store = MemoryEntityStore::new();
        let mut uow = UnitOfWork::new(&store);
        let settings = LedgerSettings {
            default_min_lock_duration: 3600,
        };

        let protocol = get_or_create(&mut uow, &settings).await.unwrap();
        assert!(protocol.was_created());
        assert_eq!(protocol.get().id, "1");
        assert_eq!(protocol.get().min_lock_duration, 3600);
    }

    #[tokio::test]
    async fn existing_row_keeps_its_lock_window() {
        let store = MemoryEntityStore::new();
        let mut uow = UnitOfWork::new(&store);
        get_or_create(&mut uow, &LedgerSettings::default()).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = UnitOfWork::new(&store);
        let settings = LedgerSettings {
            default_min_lock_duration: 1,
        };
        let protocol = get_or_create(&mut uow, &settings).await.unwrap();
        assert!(!protocol.was_created());
        assert_eq!(protocol.get().min_lock_duration, 86_400);
    }

    #[tokio::test]
    async fn totals_are_mirrored_and_rewards_accumulate() {
        let store = MemoryEntityStore::new();
        let mut uow = UnitOfWork::new(&store);
        let mut protocol = get_or_create(&mut uow, &LedgerSettings::default())
            .await
            .unwrap()
            .into_inner();

        record_stake(&mut uow, &mut protocol, Amount::from(100u64), Amount::from(5u64)).unwrap();
        record_withdraw(
            &mut uow,
            &mut protocol,
            Amount::from(60u64),
            Amount::from(4u64),
            Amount::from(3u64),
        )
        .unwrap();
        record_emergency_withdraw(&mut uow, &mut protocol, Amount::from(35u64)).unwrap();
        record_rewards_claimed(&mut uow, &mut protocol, Amount::from(3u64)).unwrap();

        assert_eq!(protocol.total_staked, Amount::from(35u64));
        assert_eq!(protocol.current_reward_rate, Amount::from(4u64));
        assert_eq!(protocol.total_rewards_distributed, Amount::from(6u64));
    }
}
