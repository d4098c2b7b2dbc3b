use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::store::{DocumentStore, FieldUpdate, StoreError};

use super::models::{Submission, SUBMISSIONS};

/// Computes a submission's completion state and average score.
#[derive(Clone)]
pub struct ReviewAggregator {
    store: Arc<dyn DocumentStore>,
}

impl ReviewAggregator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Marks the submission complete and stores the mean of its review
    /// scores once the review count reaches the quota. A count past the
    /// quota (possible under the accepted check-then-act race) is treated
    /// the same as meeting it, and a submission below quota is left exactly
    /// as it was, so a completed submission never regresses to open.
    pub async fn recompute(&self, submission_id: &str) -> Result<()> {
        let doc = self
            .store
            .get_by_id(SUBMISSIONS, submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound("submission", submission_id.to_string()))?;
        let submission: Submission = serde_json::from_value(doc).map_err(StoreError::from)?;

        let count = submission.reviews_received.len();
        if count < submission.reviews_needed as usize {
            return Ok(());
        }

        // Stored as a true mean; rounding for display is the UI's concern.
        let mean = submission
            .reviews_received
            .iter()
            .map(|r| f64::from(r.total_score))
            .sum::<f64>()
            / count as f64;

        let now = serde_json::to_value(Utc::now()).map_err(StoreError::from)?;
        self.store
            .update_by_id(
                SUBMISSIONS,
                submission_id,
                &[
                    FieldUpdate::set("averageScore", json!(mean)),
                    FieldUpdate::set("reviewsComplete", json!(true)),
                    FieldUpdate::set("updatedAt", now),
                ],
            )
            .await?;

        tracing::info!(%submission_id, reviews = count, average = mean, "submission complete");
        Ok(())
    }
}
