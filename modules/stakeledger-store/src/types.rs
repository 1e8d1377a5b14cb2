//! Core types for the entity store. Domain-agnostic.

use serde::{Deserialize, Serialize};

/// A persisted row. `payload` is the entity serialized to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    pub table: String,
    pub id: String,
    pub payload: serde_json::Value,
}

impl EntityRow {
    pub fn new(table: impl Into<String>, id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            table: table.into(),
            id: id.into(),
            payload,
        }
    }

    /// Build a row from anything implementing [`Entity`].
    pub fn from_entity<T: Entity>(entity: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(entity.table(), entity.entity_id(), serde_json::to_value(entity)?))
    }
}

/// Something that lives in one logical table under a stable id.
pub trait Entity: Serialize {
    /// Logical table the entity is stored in.
    fn table(&self) -> &'static str;

    /// Stable identifier within the table.
    fn entity_id(&self) -> &str;
}

/// Result of an upsert-with-default: whether the entity was just created or
/// already existed in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert<T> {
    Created(T),
    Existing(T),
}

impl<T> Upsert<T> {
    pub fn was_created(&self) -> bool {
        matches!(self, Upsert::Created(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Upsert::Created(v) | Upsert::Existing(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Upsert::Created(v) | Upsert::Existing(v) => v,
        }
    }
}
