//! In-memory `EntityStore` for tests and database-less replays.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::store::EntityStore;
use crate::types::EntityRow;

type Rows = BTreeMap<(String, String), serde_json::Value>;

/// In-memory entity store. Thread-safe. A batch commit is applied under a
/// single lock, so readers never observe half of it.
#[derive(Default)]
pub struct MemoryEntityStore {
    rows: Mutex<Rows>,
    unavailable: AtomicBool,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, as if the backend went away.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// All rows of one table, ordered by id.
    pub fn rows(&self, table: &str) -> Vec<EntityRow> {
        self.lock()
            .map(|rows| {
                rows.iter()
                    .filter(|((t, _), _)| t == table)
                    .map(|((t, id), payload)| EntityRow::new(t.clone(), id.clone(), payload.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of rows in one table.
    pub fn count(&self, table: &str) -> usize {
        self.lock()
            .map(|rows| rows.keys().filter(|(t, _)| t == table).count())
            .unwrap_or(0)
    }

    /// A copy of every row, for whole-store comparisons.
    pub fn snapshot(&self) -> BTreeMap<(String, String), serde_json::Value> {
        self.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Rows>> {
        self.rows
            .lock()
            .map_err(|_| anyhow!("memory entity store lock poisoned"))
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("memory entity store is unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn load(&self, table: &str, id: &str) -> Result<Option<serde_json::Value>> {
        self.ensure_available()?;
        let rows = self.lock()?;
        Ok(rows.get(&(table.to_string(), id.to_string())).cloned())
    }

    async fn save(&self, row: EntityRow) -> Result<()> {
        self.ensure_available()?;
        self.lock()?.insert((row.table, row.id), row.payload);
        Ok(())
    }

    async fn commit(&self, batch: Vec<EntityRow>) -> Result<()> {
        self.ensure_available()?;
        let mut rows = self.lock()?;
        for row in batch {
            rows.insert((row.table, row.id), row.payload);
        }
        Ok(())
    }
}
