//! PgEntityStore: entity rows in a single Postgres JSONB table.
//!
//! Every logical table shares one physical `entities` table keyed by
//! `(table_name, id)`. Saves are upserts; a batch commit runs in one
//! transaction so a failed event leaves nothing behind.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::store::EntityStore;
use crate::types::EntityRow;

const CREATE_ENTITIES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS entities (
        table_name  TEXT         NOT NULL,
        id          TEXT         NOT NULL,
        payload     JSONB        NOT NULL,
        updated_at  TIMESTAMPTZ  NOT NULL DEFAULT now(),
        PRIMARY KEY (table_name, id)
    )
"#;

const UPSERT_ENTITY: &str = r#"
    INSERT INTO entities (table_name, id, payload)
    VALUES ($1, $2, $3)
    ON CONFLICT (table_name, id)
    DO UPDATE SET payload = EXCLUDED.payload, updated_at = now()
"#;

#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and make sure the `entities` table exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Create the backing table. Idempotent.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_ENTITIES_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Number of rows in one logical table.
    pub async fn count(&self, table: &str) -> Result<i64> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM entities WHERE table_name = $1")
            .bind(table)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn load(&self, table: &str, id: &str) -> Result<Option<serde_json::Value>> {
        let row = sqlx::query_as::<_, (serde_json::Value,)>(
            "SELECT payload FROM entities WHERE table_name = $1 AND id = $2",
        )
        .bind(table)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(payload,)| payload))
    }

    async fn save(&self, row: EntityRow) -> Result<()> {
        sqlx::query(UPSERT_ENTITY)
            .bind(&row.table)
            .bind(&row.id)
            .bind(&row.payload)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn commit(&self, rows: Vec<EntityRow>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let count = rows.len();

        for row in &rows {
            sqlx::query(UPSERT_ENTITY)
                .bind(&row.table)
                .bind(&row.id)
                .bind(&row.payload)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(rows = count, "Committed entity batch");
        Ok(())
    }
}
