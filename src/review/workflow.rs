use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::identity::Actor;
use crate::store::DocumentStore;

use super::aggregate::ReviewAggregator;
use super::ledger::ReviewLedger;
use super::models::{total_score, Review, RubricCriterion, RubricScore};
use super::submissions::SubmissionManager;

pub const MIN_FEEDBACK_CHARS: usize = 50;

/// One awarded score from the review form. The criterion's max comes from
/// the submission's own rubric, not from the reviewer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreInput {
    pub criterion_name: String,
    pub score: u32,
    #[serde(default)]
    pub feedback: String,
}

/// Coordinates submissions, the ledger, and aggregation for one review
/// attempt.
#[derive(Clone)]
pub struct ReviewWorkflow {
    submissions: SubmissionManager,
    ledger: ReviewLedger,
    aggregator: ReviewAggregator,
}

impl ReviewWorkflow {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            submissions: SubmissionManager::new(store.clone()),
            ledger: ReviewLedger::new(store.clone()),
            aggregator: ReviewAggregator::new(store),
        }
    }

    pub fn submissions(&self) -> &SubmissionManager {
        &self.submissions
    }

    pub fn ledger(&self) -> &ReviewLedger {
        &self.ledger
    }

    /// Validates a review attempt, persists the review, and recomputes the
    /// submission's completion state.
    ///
    /// Checks run in a fixed order, each with its own failure: submission
    /// exists, reviewer is not the author, feedback long enough, every
    /// rubric criterion scored, reviewer not already in the ledger. The
    /// author check runs before the ledger check so an author can never
    /// burn a ledger slot on their own work.
    pub async fn submit_review(
        &self,
        submission_id: &str,
        reviewer: &Actor,
        scores: &[ScoreInput],
        overall_feedback: &str,
    ) -> Result<Review> {
        let submission = self.submissions.get(submission_id).await?;

        if reviewer.id == submission.student_id {
            return Err(AppError::SelfReview);
        }

        let feedback = overall_feedback.trim();
        if feedback.chars().count() < MIN_FEEDBACK_CHARS {
            return Err(AppError::Validation(format!(
                "overall feedback must be at least {MIN_FEEDBACK_CHARS} characters"
            )));
        }

        let rubric_scores = score_rubric(&submission.rubric, scores)?;

        if self.ledger.has_reviewed(submission_id, &reviewer.id).await? {
            return Err(AppError::DuplicateReview);
        }

        let review = Review {
            reviewer_id: reviewer.id.clone(),
            reviewer_name: reviewer.display_name.clone(),
            reviewer_email: reviewer.email.clone(),
            total_score: total_score(&rubric_scores),
            rubric_scores,
            overall_feedback: feedback.to_string(),
            reviewed_at: Utc::now(),
        };

        // Append before the ledger write. If the ledger write fails, a
        // retry is still possible; once the ledger entry exists, the review
        // it vouches for is already in the array.
        self.submissions.append_review(submission_id, &review).await?;
        self.ledger.record_reviewed(submission_id, &reviewer.id).await?;
        self.aggregator.recompute(submission_id).await?;

        tracing::info!(%submission_id, reviewer = %reviewer.id, score = review.total_score, "review accepted");
        Ok(review)
    }
}

/// Joins form scores to the submission's rubric: every criterion must carry
/// a score, and no score may exceed the criterion's max.
fn score_rubric(rubric: &[RubricCriterion], scores: &[ScoreInput]) -> Result<Vec<RubricScore>> {
    rubric
        .iter()
        .map(|criterion| {
            let input = scores
                .iter()
                .find(|s| s.criterion_name == criterion.name)
                .ok_or_else(|| {
                    AppError::Validation(format!("missing score for criterion '{}'", criterion.name))
                })?;
            if input.score > criterion.max_score {
                return Err(AppError::Validation(format!(
                    "score for '{}' exceeds the max of {}",
                    criterion.name, criterion.max_score
                )));
            }
            Ok(RubricScore {
                criterion_name: criterion.name.clone(),
                max_score: criterion.max_score,
                score: input.score,
                feedback: input.feedback.clone(),
            })
        })
        .collect()
}
