//! Event recorder: the append-only audit log.
//!
//! One record per event, keyed by the composite event id in the table named
//! after the event kind. Re-recording a replayed event writes identical
//! content, so it is a no-op in effect.

use stakeledger_common::{tables, AuditRecord, ChainEvent, LedgerError};
use stakeledger_store::UnitOfWork;

use crate::persist;

/// The audit record already stored under this event's id, if any.
///
/// Every audit table is searched: a composite id belongs to one log, so a
/// record of another kind under the same id is still a match.
pub async fn find(
    uow: &UnitOfWork<'_>,
    event: &ChainEvent,
) -> Result<Option<AuditRecord>, LedgerError> {
    let id = event.id().to_string();
    for table in tables::AUDIT {
        let record: Option<AuditRecord> =
            uow.load(table, &id).await.map_err(LedgerError::store)?;
        if record.is_some() {
            return Ok(record);
        }
    }
    Ok(None)
}

pub fn record(uow: &mut UnitOfWork<'_>, event: &ChainEvent) -> Result<AuditRecord, LedgerError> {
    let record = AuditRecord::from_chain_event(event);
    persist(uow, &record)?;
    Ok(record)
}
