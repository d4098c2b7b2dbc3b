use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::identity::Actor;
use crate::store::{DocumentStore, FieldUpdate, StoreError};

use super::models::{
    review_link, Review, RubricCriterion, Submission, SubmissionLink, VersionSnapshot, SUBMISSIONS,
};

pub fn new_submission_id() -> String {
    format!(
        "{}_{}",
        Utc::now().format("%Y%m%d"),
        Uuid::new_v4().to_string()[..8].to_string()
    )
}

/// Owns the "what was submitted" records and their version history.
#[derive(Clone)]
pub struct SubmissionManager {
    store: Arc<dyn DocumentStore>,
}

impl SubmissionManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// First submission of a piece of work: version 1, no reviews yet, and a
    /// freshly generated id that doubles as the shareable link token.
    pub async fn create(
        &self,
        author: &Actor,
        assignment_id: &str,
        course_id: &str,
        links: Vec<SubmissionLink>,
        reviews_needed: u32,
        rubric: Vec<RubricCriterion>,
    ) -> Result<(String, Submission)> {
        validate_links(&links)?;
        if reviews_needed < 1 {
            return Err(AppError::Validation(
                "reviewsNeeded must be at least 1".into(),
            ));
        }

        let id = new_submission_id();
        let now = Utc::now();
        let submission = Submission {
            student_id: author.id.clone(),
            student_name: author.display_name.clone(),
            student_email: author.email.clone(),
            assignment_id: assignment_id.to_string(),
            course_id: course_id.to_string(),
            submission_links: links,
            reviews_needed,
            rubric,
            reviews_received: Vec::new(),
            reviews_complete: false,
            average_score: None,
            review_link: review_link(&id),
            submitted_at: now,
            updated_at: now,
            version: 1,
            previous_versions: Vec::new(),
        };

        self.put(&id, &submission).await?;
        Ok((id, submission))
    }

    /// Resubmission: produces a whole new record under a new id (and thus a
    /// new review link) with the version bumped by one and an empty review
    /// list. The superseded record is never mutated; its old review link
    /// stays resolvable so historical reviews remain auditable.
    pub async fn revise(
        &self,
        existing_id: &str,
        new_links: Vec<SubmissionLink>,
    ) -> Result<(String, Submission)> {
        validate_links(&new_links)?;
        let old = self.get(existing_id).await?;

        let id = new_submission_id();
        let now = Utc::now();

        let mut previous_versions = old.previous_versions;
        previous_versions.push(VersionSnapshot {
            version: old.version,
            submission_links: old.submission_links,
            reviews_received: old.reviews_received,
            replaced_at: now,
        });

        let submission = Submission {
            student_id: old.student_id,
            student_name: old.student_name,
            student_email: old.student_email,
            assignment_id: old.assignment_id,
            course_id: old.course_id,
            submission_links: new_links,
            reviews_needed: old.reviews_needed,
            rubric: old.rubric,
            reviews_received: Vec::new(),
            reviews_complete: false,
            average_score: None,
            review_link: review_link(&id),
            submitted_at: now,
            updated_at: now,
            version: old.version + 1,
            previous_versions,
        };

        self.put(&id, &submission).await?;
        Ok((id, submission))
    }

    pub async fn get(&self, id: &str) -> Result<Submission> {
        let doc = self
            .store
            .get_by_id(SUBMISSIONS, id)
            .await?
            .ok_or_else(|| AppError::NotFound("submission", id.to_string()))?;
        Ok(serde_json::from_value(doc).map_err(StoreError::from)?)
    }

    /// Every submission record (all versions) authored by the given actor.
    pub async fn list_by_author(&self, author_id: &str) -> Result<Vec<Submission>> {
        let docs = self
            .store
            .query(SUBMISSIONS, &[("studentId", Value::String(author_id.into()))])
            .await?;

        docs.into_iter()
            .map(|doc| Ok(serde_json::from_value(doc).map_err(StoreError::from)?))
            .collect()
    }

    /// Appends an accepted review with the store's atomic array-append, so
    /// two reviews landing at once cannot overwrite each other.
    pub async fn append_review(&self, id: &str, review: &Review) -> Result<()> {
        let value = serde_json::to_value(review).map_err(StoreError::from)?;
        let now = serde_json::to_value(Utc::now()).map_err(StoreError::from)?;
        self.store
            .update_by_id(
                SUBMISSIONS,
                id,
                &[
                    FieldUpdate::append("reviewsReceived", value),
                    FieldUpdate::set("updatedAt", now),
                ],
            )
            .await?;
        Ok(())
    }

    async fn put(&self, id: &str, submission: &Submission) -> Result<()> {
        let doc = serde_json::to_value(submission).map_err(StoreError::from)?;
        self.store.set_by_id(SUBMISSIONS, id, doc).await?;
        Ok(())
    }
}

fn validate_links(links: &[SubmissionLink]) -> Result<()> {
    if links.is_empty() {
        return Err(AppError::Validation(
            "at least one submission link is required".into(),
        ));
    }
    if links.iter().any(|l| l.url.trim().is_empty()) {
        return Err(AppError::Validation(
            "every submission link needs a URL".into(),
        ));
    }
    Ok(())
}
