//! The three judge-backed stages. Each takes typed input, makes exactly one
//! judge call, and returns `Result<_, StageError>`. Timeouts and
//! cancellation are applied by the orchestrator, not here.

pub mod generator;
pub mod insertion;
pub mod prompt;
pub mod ranker;

pub use generator::{generate_samples, target_distribution, GeneratedCorpus, GenerationParams};
pub use insertion::{clamp_rank, insert_submission, InsertionParams};
pub use ranker::{rank_samples, RankingOutcome, RankingParams};
