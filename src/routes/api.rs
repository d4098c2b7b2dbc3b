use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::identity::{actor_from_headers, Actor};
use crate::review::models::parse_review_link;
use crate::review::{Review, RubricCriterion, ScoreInput, Submission, SubmissionLink};
use crate::state::AppState;

fn current_actor(state: &AppState, headers: &HeaderMap) -> Result<Actor> {
    actor_from_headers(headers)
        .or_else(|| state.identity.current_actor())
        .ok_or(AppError::Unauthorized)
}

/// Accepts either a bare submission id or a pasted `review/<id>` link token.
fn resolve_token(token: &str) -> &str {
    parse_review_link(token).unwrap_or(token)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub assignment_id: String,
    pub course_id: String,
    pub links: Vec<SubmissionLink>,
    pub reviews_needed: u32,
    pub rubric: Vec<RubricCriterion>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionCreated {
    pub submission_id: String,
    pub submission: Submission,
}

pub async fn create_submission(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateSubmissionRequest>,
) -> Result<Json<SubmissionCreated>> {
    let actor = current_actor(&state, &headers)?;
    let (submission_id, submission) = state
        .review
        .submissions()
        .create(
            &actor,
            &req.assignment_id,
            &req.course_id,
            req.links,
            req.reviews_needed,
            req.rubric,
        )
        .await?;

    tracing::info!(%submission_id, author = %actor.id, "submission created");
    Ok(Json(SubmissionCreated {
        submission_id,
        submission,
    }))
}

pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<String>,
) -> Result<Json<Submission>> {
    let submission = state.review.submissions().get(&submission_id).await?;
    Ok(Json(submission))
}

pub async fn my_submissions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Submission>>> {
    let actor = current_actor(&state, &headers)?;
    let submissions = state.review.submissions().list_by_author(&actor.id).await?;
    Ok(Json(submissions))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviseRequest {
    pub links: Vec<SubmissionLink>,
}

pub async fn revise_submission(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<String>,
    Json(req): Json<ReviseRequest>,
) -> Result<Json<SubmissionCreated>> {
    let (new_id, submission) = state
        .review
        .submissions()
        .revise(&submission_id, req.links)
        .await?;

    tracing::info!(old = %submission_id, new = %new_id, version = submission.version, "submission revised");
    Ok(Json(SubmissionCreated {
        submission_id: new_id,
        submission,
    }))
}

/// Resolves a shared review link to the submission the review form needs.
pub async fn review_target(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<Submission>> {
    let submission = state
        .review
        .submissions()
        .get(resolve_token(&token))
        .await?;
    Ok(Json(submission))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    pub rubric_scores: Vec<ScoreInput>,
    pub overall_feedback: String,
}

pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<Json<Review>> {
    let actor = current_actor(&state, &headers)?;
    let review = state
        .review
        .submit_review(
            resolve_token(&token),
            &actor,
            &req.rubric_scores,
            &req.overall_feedback,
        )
        .await?;
    Ok(Json(review))
}
