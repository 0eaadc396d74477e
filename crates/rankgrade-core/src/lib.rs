//! Rank-then-score grading.
//!
//! A submission is graded by generating a calibration corpus of reference
//! texts, ordering that corpus once, locating the submission inside the
//! order, and mapping the resulting position onto the score band.
//!
//! - `stages`: the generator, ranker and insertion judge, each a standalone async fn
//! - `score`: pure rank -> score mapping
//! - `pipeline`: the orchestrator state machine
//! - `providers::judge`: the text-completion oracle and its implementations

pub mod config;
pub mod errors;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod providers;
pub mod score;
pub mod stages;

pub use errors::{GradingError, Stage, StageError};
pub use model::{GradingRequest, ScoreResult};
pub use pipeline::{GradingOutcome, GradingState, Grader};
pub use providers::judge::TextJudge;
