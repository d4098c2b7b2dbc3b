//! End-to-end exercises of the review workflow against the in-memory store.

use std::sync::Arc;

use ronda::error::AppError;
use ronda::identity::Actor;
use ronda::review::{
    ReviewWorkflow, RubricCriterion, ScoreInput, SubmissionLink, MIN_FEEDBACK_CHARS,
};
use ronda::store::memory::MemoryStore;

fn actor(id: &str, name: &str) -> Actor {
    Actor {
        id: id.into(),
        display_name: name.into(),
        email: format!("{id}@example.edu"),
    }
}

fn github_link() -> SubmissionLink {
    SubmissionLink {
        label: "GitHub".into(),
        url: "https://github.com/ada/project".into(),
        link_type: "github".into(),
        required: true,
    }
}

fn rubric_one_criterion(max: u32) -> Vec<RubricCriterion> {
    vec![RubricCriterion {
        name: "quality".into(),
        description: "Overall quality of the work".into(),
        max_score: max,
    }]
}

fn score(criterion: &str, awarded: u32) -> ScoreInput {
    ScoreInput {
        criterion_name: criterion.into(),
        score: awarded,
        feedback: "Solid work".into(),
    }
}

fn feedback(len: usize) -> String {
    "x".repeat(len)
}

fn workflow() -> ReviewWorkflow {
    ReviewWorkflow::new(Arc::new(MemoryStore::new()))
}

async fn create_submission(
    workflow: &ReviewWorkflow,
    author: &Actor,
    quota: u32,
) -> String {
    let (id, _) = workflow
        .submissions()
        .create(
            author,
            "assignment-1",
            "course-1",
            vec![github_link()],
            quota,
            rubric_one_criterion(10),
        )
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn full_scenario_single_reviewer_quota() {
    let workflow = workflow();
    let author = actor("x", "Author X");
    let reviewer = actor("y", "Reviewer Y");

    let id = create_submission(&workflow, &author, 1).await;

    let review = workflow
        .submit_review(&id, &reviewer, &[score("quality", 9)], &feedback(60))
        .await
        .unwrap();
    assert_eq!(review.total_score, 90);

    assert!(workflow.ledger().has_reviewed(&id, "y").await.unwrap());

    let submission = workflow.submissions().get(&id).await.unwrap();
    assert_eq!(submission.reviews_received.len(), 1);
    assert!(submission.reviews_complete);
    assert_eq!(submission.average_score, Some(90.0));

    // Y again -> duplicate; X -> self review.
    let err = workflow
        .submit_review(&id, &reviewer, &[score("quality", 9)], &feedback(60))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateReview));

    let err = workflow
        .submit_review(&id, &author, &[score("quality", 9)], &feedback(60))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SelfReview));
}

#[tokio::test]
async fn aggregation_waits_for_the_quota() {
    let workflow = workflow();
    let author = actor("a", "Author");
    let id = create_submission(&workflow, &author, 2).await;

    workflow
        .submit_review(&id, &actor("r1", "One"), &[score("quality", 8)], &feedback(60))
        .await
        .unwrap();

    let submission = workflow.submissions().get(&id).await.unwrap();
    assert!(!submission.reviews_complete);
    assert_eq!(submission.average_score, None);

    workflow
        .submit_review(&id, &actor("r2", "Two"), &[score("quality", 9)], &feedback(60))
        .await
        .unwrap();

    let submission = workflow.submissions().get(&id).await.unwrap();
    assert!(submission.reviews_complete);
    assert_eq!(submission.average_score, Some(85.0));
}

#[tokio::test]
async fn self_review_is_rejected_before_anything_else() {
    let workflow = workflow();
    let author = actor("a", "Author");
    let id = create_submission(&workflow, &author, 2).await;

    // Even with short feedback and no scores, the author gets the
    // self-review failure, never a validation one.
    let err = workflow
        .submit_review(&id, &author, &[], "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SelfReview));

    // And the ledger stays untouched.
    assert!(!workflow.ledger().has_reviewed(&id, "a").await.unwrap());
}

#[tokio::test]
async fn unknown_submission_is_not_found() {
    let workflow = workflow();
    let err = workflow
        .submit_review("20240101_deadbeef", &actor("r", "R"), &[], &feedback(60))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(..)));
}

#[tokio::test]
async fn feedback_length_gate_is_exact() {
    let workflow = workflow();
    let author = actor("a", "Author");
    let reviewer = actor("r", "Reviewer");
    let id = create_submission(&workflow, &author, 1).await;

    let err = workflow
        .submit_review(
            &id,
            &reviewer,
            &[score("quality", 9)],
            &feedback(MIN_FEEDBACK_CHARS - 1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // A failed validation leaves no ledger entry, so the retry goes through.
    workflow
        .submit_review(
            &id,
            &reviewer,
            &[score("quality", 9)],
            &feedback(MIN_FEEDBACK_CHARS),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn surrounding_whitespace_does_not_count_as_feedback() {
    let workflow = workflow();
    let author = actor("a", "Author");
    let id = create_submission(&workflow, &author, 1).await;

    let padded = format!("   {}   ", feedback(MIN_FEEDBACK_CHARS - 1));
    let err = workflow
        .submit_review(&id, &actor("r", "R"), &[score("quality", 9)], &padded)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn incomplete_rubric_is_rejected_without_side_effects() {
    let workflow = workflow();
    let author = actor("a", "Author");
    let reviewer = actor("r", "Reviewer");
    let id = create_submission(&workflow, &author, 1).await;

    let err = workflow
        .submit_review(&id, &reviewer, &[], &feedback(60))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let submission = workflow.submissions().get(&id).await.unwrap();
    assert!(submission.reviews_received.is_empty());
    assert!(!workflow.ledger().has_reviewed(&id, "r").await.unwrap());
}

#[tokio::test]
async fn revision_archives_reviews_and_keeps_the_old_link_readable() {
    let workflow = workflow();
    let author = actor("a", "Author");
    let id = create_submission(&workflow, &author, 2).await;

    workflow
        .submit_review(&id, &actor("r1", "One"), &[score("quality", 7)], &feedback(60))
        .await
        .unwrap();

    let mut new_link = github_link();
    new_link.url = "https://github.com/ada/project-v2".into();
    let (new_id, revised) = workflow
        .submissions()
        .revise(&id, vec![new_link])
        .await
        .unwrap();

    assert_eq!(revised.version, 2);
    assert!(revised.reviews_received.is_empty());
    assert!(!revised.reviews_complete);
    assert_eq!(revised.previous_versions.len(), 1);
    assert_eq!(revised.previous_versions[0].reviews_received.len(), 1);
    assert_eq!(
        revised.previous_versions[0].submission_links[0].url,
        "https://github.com/ada/project"
    );

    // The superseded record still resolves with its one historical review.
    let old = workflow.submissions().get(&id).await.unwrap();
    assert_eq!(old.version, 1);
    assert_eq!(old.reviews_received.len(), 1);

    // The reviewer of version 1 starts fresh on version 2.
    workflow
        .submit_review(&new_id, &actor("r1", "One"), &[score("quality", 8)], &feedback(60))
        .await
        .unwrap();
}

#[tokio::test]
async fn review_past_the_quota_still_counts_into_the_mean() {
    // The accepted check-then-act race can let one extra review through;
    // aggregation treats it the same as exactly meeting the quota.
    let workflow = workflow();
    let author = actor("a", "Author");
    let id = create_submission(&workflow, &author, 1).await;

    workflow
        .submit_review(&id, &actor("r1", "One"), &[score("quality", 10)], &feedback(60))
        .await
        .unwrap();
    workflow
        .submit_review(&id, &actor("r2", "Two"), &[score("quality", 6)], &feedback(60))
        .await
        .unwrap();

    let submission = workflow.submissions().get(&id).await.unwrap();
    assert_eq!(submission.reviews_received.len(), 2);
    assert!(submission.reviews_complete);
    assert_eq!(submission.average_score, Some(80.0));
}
