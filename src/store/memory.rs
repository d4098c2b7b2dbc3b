use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{DocumentStore, FieldUpdate, StoreError};

/// HashMap-backed store for tests and local development.
///
/// Every mutation holds the write lock for its whole duration, which gives
/// the same per-document atomicity the Postgres adapter gets from
/// single-statement JSONB updates.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().expect("store lock poisoned");
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn set_by_id(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().expect("store lock poisoned");
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        updates: &[FieldUpdate],
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().expect("store lock poisoned");
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::Missing {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let fields = doc.as_object_mut().ok_or_else(|| StoreError::Corrupt {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;

        for update in updates {
            match update {
                FieldUpdate::Set { field, value } => {
                    fields.insert(field.clone(), value.clone());
                }
                FieldUpdate::ArrayAppend { field, value } => {
                    let slot = fields.entry(field.clone()).or_insert_with(|| json!([]));
                    let array = slot.as_array_mut().ok_or_else(|| StoreError::Corrupt {
                        collection: collection.to_string(),
                        id: id.to_string(),
                    })?;
                    array.push(value.clone());
                }
            }
        }

        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
    ) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().expect("store lock poisoned");
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .values()
            .filter(|doc| {
                filters
                    .iter()
                    .all(|(field, value)| doc.get(*field) == Some(value))
            })
            .cloned()
            .collect())
    }
}
