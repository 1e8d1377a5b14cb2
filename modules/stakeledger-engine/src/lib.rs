//! Staking ledger engine.
//!
//! Folds an ordered stream of decoded staking events into per-account
//! balances, protocol totals, stake positions, and an append-only audit log.
//!
//! Every event is handled inside one `UnitOfWork`: the handler stages its
//! writes, and the dispatcher commits them together or not at all.

pub mod dispatcher;
pub mod ledger;
pub mod positions;
pub mod protocol;
pub mod recorder;

pub use dispatcher::{DispatchOutcome, DispatchSummary, Dispatcher};

use stakeledger_common::LedgerError;
use stakeledger_store::{Entity, UnitOfWork};

/// Stage an entity write, reporting failures as store errors.
pub(crate) fn persist<T: Entity>(uow: &mut UnitOfWork<'_>, entity: &T) -> Result<(), LedgerError> {
    uow.save(entity).map_err(LedgerError::store)
}
