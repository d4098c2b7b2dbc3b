pub mod aggregate;
pub mod ledger;
pub mod models;
pub mod submissions;
pub mod workflow;

pub use aggregate::ReviewAggregator;
pub use ledger::ReviewLedger;
pub use models::*;
pub use submissions::SubmissionManager;
pub use workflow::{ReviewWorkflow, ScoreInput, MIN_FEEDBACK_CHARS};
