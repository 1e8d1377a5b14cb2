//! The `EntityStore` seam between the ledger and its persistence engine.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::EntityRow;

/// Key-value persistence with load-by-id and upsert semantics.
///
/// Implemented by `PgEntityStore` (postgres) and `MemoryEntityStore` (tests,
/// replay without a database). Also implemented for `Arc<S>` so a store can
/// be shared with test assertions.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Load a row's payload, or `None` if the id has never been saved.
    async fn load(&self, table: &str, id: &str) -> Result<Option<serde_json::Value>>;

    /// Insert or overwrite a single row.
    async fn save(&self, row: EntityRow) -> Result<()>;

    /// Insert or overwrite a batch of rows, all or nothing.
    ///
    /// The default applies rows one at a time and is only atomic if the
    /// implementation cannot fail halfway. Backends with transactions
    /// override it.
    async fn commit(&self, rows: Vec<EntityRow>) -> Result<()> {
        for row in rows {
            self.save(row).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: EntityStore + ?Sized> EntityStore for Arc<S> {
    async fn load(&self, table: &str, id: &str) -> Result<Option<serde_json::Value>> {
        (**self).load(table, id).await
    }

    async fn save(&self, row: EntityRow) -> Result<()> {
        (**self).save(row).await
    }

    async fn commit(&self, rows: Vec<EntityRow>) -> Result<()> {
        (**self).commit(rows).await
    }
}
