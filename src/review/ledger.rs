use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::store::{DocumentStore, StoreError};

use super::models::{LedgerEntry, REVIEW_LEDGER};

fn entry_id(submission_id: &str, reviewer_id: &str) -> String {
    format!("{submission_id}:{reviewer_id}")
}

/// Records which reviewer has reviewed which submission.
///
/// Kept separate from the submission's review array on purpose: the
/// "already reviewed" check is then an O(1) key lookup, and its existence is
/// the sole source of truth even when the ledger write and the review
/// append land at different times.
#[derive(Clone)]
pub struct ReviewLedger {
    store: Arc<dyn DocumentStore>,
}

impl ReviewLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Absence reads as false; never errors on a missing entry.
    pub async fn has_reviewed(&self, submission_id: &str, reviewer_id: &str) -> Result<bool> {
        match self
            .store
            .get_by_id(REVIEW_LEDGER, &entry_id(submission_id, reviewer_id))
            .await?
        {
            Some(doc) => {
                let entry: LedgerEntry =
                    serde_json::from_value(doc).map_err(StoreError::from)?;
                Ok(entry.has_reviewed)
            }
            None => Ok(false),
        }
    }

    /// Idempotent upsert keyed on the (submission, reviewer) pair. A retried
    /// write lands on the same key and never creates a second logical entry.
    pub async fn record_reviewed(&self, submission_id: &str, reviewer_id: &str) -> Result<()> {
        let entry = LedgerEntry {
            reviewer_id: reviewer_id.to_string(),
            submission_id: submission_id.to_string(),
            has_reviewed: true,
            reviewed_at: Utc::now(),
        };
        let doc = serde_json::to_value(&entry).map_err(StoreError::from)?;
        self.store
            .set_by_id(REVIEW_LEDGER, &entry_id(submission_id, reviewer_id), doc)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn absent_entry_reads_as_false() {
        let ledger = ReviewLedger::new(Arc::new(MemoryStore::new()));
        assert!(!ledger.has_reviewed("s1", "r1").await.unwrap());
    }

    #[tokio::test]
    async fn record_then_read() {
        let ledger = ReviewLedger::new(Arc::new(MemoryStore::new()));
        ledger.record_reviewed("s1", "r1").await.unwrap();
        assert!(ledger.has_reviewed("s1", "r1").await.unwrap());
        assert!(!ledger.has_reviewed("s1", "r2").await.unwrap());
        assert!(!ledger.has_reviewed("s2", "r1").await.unwrap());
    }

    #[tokio::test]
    async fn record_twice_leaves_one_logical_entry() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ReviewLedger::new(store.clone());
        ledger.record_reviewed("s1", "r1").await.unwrap();
        ledger.record_reviewed("s1", "r1").await.unwrap();

        use crate::store::DocumentStore;
        let entries = store
            .query(REVIEW_LEDGER, &[("submissionId", json!("s1"))])
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["hasReviewed"], json!(true));
        assert_eq!(entries[0]["reviewerId"], json!("r1"));
    }
}
