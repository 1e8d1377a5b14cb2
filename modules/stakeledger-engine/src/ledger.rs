//! Account ledger: per-user staked balance, pending rewards, last stake time.
//!
//! Accounts are loaded fresh from the unit of work on every event. Each
//! mutation is persisted before it returns.

use stakeledger_common::{account_id, tables, Account, Address, Amount, LedgerError, Timestamp};
use stakeledger_store::{UnitOfWork, Upsert};
use tracing::debug;

use crate::persist;

/// Load the account for `address`, creating a zeroed one on first sight.
/// A created account is staged immediately so later loads see it.
pub async fn get_or_create(
    uow: &mut UnitOfWork<'_>,
    address: &Address,
) -> Result<Upsert<Account>, LedgerError> {
    let id = account_id(address);
    let account = uow
        .upsert_with(tables::ACCOUNT, &id, || Account::new(id.clone()))
        .await
        .map_err(LedgerError::store)?;

    if account.was_created() {
        debug!(account = %id, "Account created");
    }
    Ok(account)
}

pub fn apply_stake_delta(
    uow: &mut UnitOfWork<'_>,
    account: &mut Account,
    amount: Amount,
    timestamp: Timestamp,
) -> Result<(), LedgerError> {
    account.credit_stake(amount, timestamp)?;
    persist(uow, account)
}

pub fn apply_withdraw_delta(
    uow: &mut UnitOfWork<'_>,
    account: &mut Account,
    amount: Amount,
) -> Result<(), LedgerError> {
    account.debit_stake(amount)?;
    persist(uow, account)
}

/// The penalty is forfeited principal: it leaves the staked balance along
/// with the withdrawn amount.
pub fn apply_emergency_withdraw_delta(
    uow: &mut UnitOfWork<'_>,
    account: &mut Account,
    amount: Amount,
    penalty: Amount,
) -> Result<(), LedgerError> {
    let debit = amount
        .checked_add(penalty)
        .ok_or(LedgerError::Overflow { field: "emergency_withdrawn.amount + penalty" })?;
    account.debit_stake(debit)?;
    persist(uow, account)
}

/// Overwrite, not accumulate: the event carries the contract's new value.
pub fn set_pending_rewards(
    uow: &mut UnitOfWork<'_>,
    account: &mut Account,
    pending_rewards: Amount,
) -> Result<(), LedgerError> {
    account.pending_rewards = pending_rewards;
    persist(uow, account)
}
