use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document store collections owned by the peer review core.
pub const SUBMISSIONS: &str = "peer_submissions";
pub const REVIEW_LEDGER: &str = "peer_review_ledger";

/// One link the author hands to reviewers (repository, demo, document...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionLink {
    pub label: String,
    pub url: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricCriterion {
    pub name: String,
    pub description: String,
    pub max_score: u32,
}

/// A reviewer's score against one rubric criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricScore {
    pub criterion_name: String,
    pub max_score: u32,
    pub score: u32,
    pub feedback: String,
}

/// One reviewer's evaluation of a specific submission version. Created
/// exactly once per (reviewer, version) pair and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub reviewer_id: String,
    pub reviewer_name: String,
    pub reviewer_email: String,
    pub rubric_scores: Vec<RubricScore>,
    pub overall_feedback: String,
    pub total_score: u32,
    pub reviewed_at: DateTime<Utc>,
}

/// What a superseded version looked like when it was replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    pub version: u32,
    pub submission_links: Vec<SubmissionLink>,
    pub reviews_received: Vec<Review>,
    pub replaced_at: DateTime<Utc>,
}

/// One author's work product offered for peer evaluation. The submission id
/// is the document id and doubles as the shareable link token; it never
/// appears as a field of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub student_id: String,
    pub student_name: String,
    pub student_email: String,
    pub assignment_id: String,
    pub course_id: String,
    pub submission_links: Vec<SubmissionLink>,
    pub reviews_needed: u32,
    pub rubric: Vec<RubricCriterion>,
    pub reviews_received: Vec<Review>,
    pub reviews_complete: bool,
    pub average_score: Option<f64>,
    pub review_link: String,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
    pub previous_versions: Vec<VersionSnapshot>,
}

/// Proof that a reviewer has completed a review of a submission, keyed by
/// the (submission, reviewer) pair independently of the review content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub reviewer_id: String,
    pub submission_id: String,
    pub has_reviewed: bool,
    pub reviewed_at: DateTime<Utc>,
}

/// Integer percentage 0..=100: round(100 * awarded / max), 0 when the
/// rubric has no weight at all.
pub fn total_score(scores: &[RubricScore]) -> u32 {
    let max: u32 = scores.iter().map(|s| s.max_score).sum();
    if max == 0 {
        return 0;
    }
    let awarded: u32 = scores.iter().map(|s| s.score).sum();
    (100.0 * f64::from(awarded) / f64::from(max)).round() as u32
}

/// The shareable link token for a submission.
pub fn review_link(submission_id: &str) -> String {
    format!("review/{submission_id}")
}

/// Extracts the submission id from a shared review link: the path segment
/// after the last literal `review` segment.
pub fn parse_review_link(link: &str) -> Option<&str> {
    let mut found = None;
    let mut segments = link.split('/').peekable();
    while let Some(segment) = segments.next() {
        if segment == "review" {
            if let Some(next) = segments.peek() {
                if !next.is_empty() {
                    found = Some(*next);
                }
            }
        }
    }
    found
}
