//! Generic, domain-agnostic entity store.
//!
//! Rows are opaque JSON payloads keyed by `(table, id)`. Saves are upserts.
//! Zero knowledge of accounts, stakes, or any domain concept.
//!
//! Consumers implement [`Entity`] for their own types and stage writes in a
//! [`UnitOfWork`], which commits them to the backing store in one batch.

pub mod memory;
pub mod postgres;
pub mod store;
pub mod types;
pub mod unit_of_work;

pub use memory::MemoryEntityStore;
pub use postgres::PgEntityStore;
pub use store::EntityStore;
pub use types::{Entity, EntityRow, Upsert};
pub use unit_of_work::UnitOfWork;
