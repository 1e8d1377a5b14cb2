//! UnitOfWork: the write buffer for one logical transaction.
//!
//! Reads consult the buffer before the store, so an entity saved earlier in
//! the same unit is visible to later loads. Nothing reaches the store until
//! `commit`, which hands the whole buffer over in a single batch.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::store::EntityStore;
use crate::types::{Entity, EntityRow, Upsert};

pub struct UnitOfWork<'s> {
    store: &'s dyn EntityStore,
    pending: BTreeMap<(String, String), serde_json::Value>,
}

impl<'s> UnitOfWork<'s> {
    pub fn new(store: &'s dyn EntityStore) -> Self {
        Self {
            store,
            pending: BTreeMap::new(),
        }
    }

    /// Load a typed entity, preferring writes staged in this unit.
    pub async fn load<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<Option<T>> {
        let payload = match self.pending.get(&(table.to_string(), id.to_string())) {
            Some(staged) => Some(staged.clone()),
            None => self.store.load(table, id).await?,
        };

        payload
            .map(|value| {
                serde_json::from_value(value)
                    .with_context(|| format!("Failed to deserialize {table}/{id}"))
            })
            .transpose()
    }

    /// Stage an entity write. Later saves of the same id replace earlier ones.
    pub fn save<T: Entity>(&mut self, entity: &T) -> Result<()> {
        let row = EntityRow::from_entity(entity)
            .with_context(|| format!("Failed to serialize {}/{}", entity.table(), entity.entity_id()))?;
        self.pending.insert((row.table, row.id), row.payload);
        Ok(())
    }

    /// Load an entity, or create it from `default` and stage it immediately.
    pub async fn upsert_with<T, F>(&mut self, table: &str, id: &str, default: F) -> Result<Upsert<T>>
    where
        T: Entity + DeserializeOwned,
        F: FnOnce() -> T,
    {
        if let Some(existing) = self.load::<T>(table, id).await? {
            return Ok(Upsert::Existing(existing));
        }

        let created = default();
        self.save(&created)?;
        Ok(Upsert::Created(created))
    }

    /// Number of distinct rows staged so far.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Flush every staged row to the store in one batch. Returns the row count.
    pub async fn commit(self) -> Result<usize> {
        let rows: Vec<EntityRow> = self
            .pending
            .into_iter()
            .map(|((table, id), payload)| EntityRow { table, id, payload })
            .collect();
        let count = rows.len();

        self.store.commit(rows).await?;
        debug!(rows = count, "Unit of work committed");
        Ok(count)
    }
}
