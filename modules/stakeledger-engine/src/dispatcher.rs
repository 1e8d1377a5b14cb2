//! The dispatch loop.

use stakeledger_common::{
    AuditRecord, ChainEvent, EventId, LedgerError, LedgerSettings, StakingEvent,
};
use stakeledger_store::{EntityStore, UnitOfWork};
use tracing::{debug, warn};

use crate::{ledger, positions, protocol, recorder};

/// What dispatching one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Deltas applied and committed.
    Applied {
        event_id: EventId,
        account_created: bool,
        protocol_created: bool,
        /// Id of the position opened by a `Staked` event.
        position: Option<String>,
    },
    /// The event had already been recorded. Its audit record was rewritten
    /// unchanged and no deltas were applied.
    Duplicate { event_id: EventId },
}

/// Counts from a `dispatch_all` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub applied: usize,
    pub duplicates: usize,
}

/// Folds staking events into persisted ledger state, one event at a time.
///
/// Each dispatch loads what it needs, applies the event in a fixed order,
/// and commits all writes together. Nothing is remembered between events
/// except what is in the store, so replaying a stream from scratch is
/// deterministic. Callers must not dispatch two events concurrently.
pub struct Dispatcher<S: EntityStore> {
    store: S,
    settings: LedgerSettings,
}

impl<S: EntityStore> Dispatcher<S> {
    pub fn new(store: S, settings: LedgerSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Dispatch one event. Either every write it causes is committed, or
    /// none is and the error is returned to the ingestion driver.
    pub async fn dispatch(&self, event: &ChainEvent) -> Result<DispatchOutcome, LedgerError> {
        let event_id = event.id();
        let mut uow = UnitOfWork::new(&self.store);

        let outcome = match recorder::find(&uow, event).await? {
            Some(existing) => {
                if existing != AuditRecord::from_chain_event(event) {
                    warn!(event_id = %event_id, kind = event.event.event_type(), "Conflicting replay");
                    return Err(LedgerError::ConflictingEvent {
                        id: event_id.to_string(),
                    });
                }
                warn!(event_id = %event_id, kind = event.event.event_type(), "Replayed event, skipping deltas");
                recorder::record(&mut uow, event)?;
                DispatchOutcome::Duplicate { event_id }
            }
            None => self.apply(&mut uow, event).await?,
        };

        uow.commit().await.map_err(LedgerError::store)?;
        Ok(outcome)
    }

    /// Dispatch events in the order given, stopping at the first failure.
    pub async fn dispatch_all<'a, I>(&self, events: I) -> Result<DispatchSummary, LedgerError>
    where
        I: IntoIterator<Item = &'a ChainEvent>,
    {
        let mut summary = DispatchSummary::default();
        for event in events {
            match self.dispatch(event).await? {
                DispatchOutcome::Applied { .. } => summary.applied += 1,
                DispatchOutcome::Duplicate { .. } => summary.duplicates += 1,
            }
        }
        Ok(summary)
    }

    async fn apply(
        &self,
        uow: &mut UnitOfWork<'_>,
        event: &ChainEvent,
    ) -> Result<DispatchOutcome, LedgerError> {
        let event_id = event.id();
        let account = ledger::get_or_create(uow, event.event.user()).await?;
        let account_created = account.was_created();
        let mut account = account.into_inner();
        let mut position = None;

        // Account first, then protocol, then derived records.
        let protocol_created = match &event.event {
            StakingEvent::Staked {
                amount,
                timestamp,
                new_total_staked,
                current_reward_rate,
                ..
            } => {
                ledger::apply_stake_delta(uow, &mut account, *amount, *timestamp)?;

                let upsert = protocol::get_or_create(uow, &self.settings).await?;
                let created = upsert.was_created();
                let mut aggregate = upsert.into_inner();
                protocol::record_stake(uow, &mut aggregate, *new_total_staked, *current_reward_rate)?;

                // Snapshot is taken from the aggregate as just updated.
                let opened = positions::open_position(
                    uow,
                    event_id,
                    &account,
                    *amount,
                    *timestamp,
                    &aggregate,
                    &event.provenance,
                )?;
                position = Some(opened.id);
                created
            }

            StakingEvent::Withdrawn {
                amount,
                new_total_staked,
                current_reward_rate,
                rewards_accrued,
                ..
            } => {
                ledger::apply_withdraw_delta(uow, &mut account, *amount)?;

                let upsert = protocol::get_or_create(uow, &self.settings).await?;
                let created = upsert.was_created();
                protocol::record_withdraw(
                    uow,
                    &mut upsert.into_inner(),
                    *new_total_staked,
                    *current_reward_rate,
                    *rewards_accrued,
                )?;
                created
            }

            StakingEvent::EmergencyWithdrawn {
                amount,
                penalty,
                new_total_staked,
                ..
            } => {
                ledger::apply_emergency_withdraw_delta(uow, &mut account, *amount, *penalty)?;

                let upsert = protocol::get_or_create(uow, &self.settings).await?;
                let created = upsert.was_created();
                protocol::record_emergency_withdraw(uow, &mut upsert.into_inner(), *new_total_staked)?;
                created
            }

            StakingEvent::RewardsClaimed {
                amount,
                new_pending_rewards,
                ..
            } => {
                ledger::set_pending_rewards(uow, &mut account, *new_pending_rewards)?;

                let upsert = protocol::get_or_create(uow, &self.settings).await?;
                let created = upsert.was_created();
                protocol::record_rewards_claimed(uow, &mut upsert.into_inner(), *amount)?;
                created
            }
        };

        recorder::record(uow, event)?;

        debug!(
            event_id = %event_id,
            kind = event.event.event_type(),
            account = %account.id,
            staked = %account.staked_amount,
            "Event applied"
        );

        Ok(DispatchOutcome::Applied {
            event_id,
            account_created,
            protocol_created,
            position,
        })
    }
}
