//! Position tracker: one immutable record per stake.

use stakeledger_common::{
    Account, Amount, EventId, LedgerError, PositionStatus, ProtocolAggregate, Provenance,
    StakePosition, Timestamp,
};
use stakeledger_store::UnitOfWork;
use tracing::debug;

use crate::persist;

/// Create and stage the position for one stake.
///
/// `protocol` must already reflect this event's update: its totals are
/// copied into the position as the snapshot. Positions always start (and,
/// since withdrawals carry no position id, stay) `Active`.
pub fn open_position(
    uow: &mut UnitOfWork<'_>,
    id: EventId,
    account: &Account,
    amount: Amount,
    timestamp: Timestamp,
    protocol: &ProtocolAggregate,
    provenance: &Provenance,
) -> Result<StakePosition, LedgerError> {
    let position = StakePosition {
        id: id.to_string(),
        account: account.id.clone(),
        amount,
        timestamp,
        unlock_time: protocol.unlock_time(timestamp)?,
        total_staked: protocol.total_staked,
        current_reward_rate: protocol.current_reward_rate,
        transaction_hash: provenance.transaction_hash,
        status: PositionStatus::Active,
        block_number: provenance.block_number,
        block_timestamp: provenance.block_timestamp,
    };

    persist(uow, &position)?;
    debug!(
        position = %position.id,
        account = %position.account,
        unlock_time = position.unlock_time,
        "Stake position opened"
    );
    Ok(position)
}
