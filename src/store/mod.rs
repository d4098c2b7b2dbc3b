pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no document '{id}' in collection '{collection}'")]
    Missing { collection: String, id: String },

    #[error("document '{id}' in collection '{collection}' is not a JSON object")]
    Corrupt { collection: String, id: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Codec(#[from] serde_json::Error),
}

/// One field mutation inside a partial update.
#[derive(Debug, Clone)]
pub enum FieldUpdate {
    Set { field: String, value: Value },
    /// Appends a single element to an array field in place. Concurrent
    /// appends to the same document must not lose each other, so this is
    /// never implemented as read-whole-array / modify / write-whole-array.
    ArrayAppend { field: String, value: Value },
}

impl FieldUpdate {
    pub fn set(field: &str, value: Value) -> Self {
        Self::Set {
            field: field.to_string(),
            value,
        }
    }

    pub fn append(field: &str, value: Value) -> Self {
        Self::ArrayAppend {
            field: field.to_string(),
            value,
        }
    }
}

/// Collection-oriented document store. No transactions across documents are
/// assumed; the only atomicity guarantee is per document, per call.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Full upsert of a document under (collection, id).
    async fn set_by_id(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError>;

    /// Partial update applied atomically to one existing document. Fails
    /// with `Missing` if the document does not exist.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        updates: &[FieldUpdate],
    ) -> Result<(), StoreError>;

    /// All documents in the collection whose top-level fields equal every
    /// given (field, value) pair.
    async fn query(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
    ) -> Result<Vec<Value>, StoreError>;
}
