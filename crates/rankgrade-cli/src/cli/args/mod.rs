use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod common;
pub use common::*;

#[derive(Parser)]
#[command(
    name = "rankgrade",
    version,
    about = "Rank-then-score grading: calibrate against a generated corpus, then place the submission in it"
)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, env = "RANKGRADE_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Grade one submission end to end
    Grade(GradeArgs),
    /// Map an insertion rank to a score without calling a judge
    Score(ScoreArgs),
    /// Write a default pipeline config file
    InitConfig(InitConfigArgs),
}

#[derive(clap::Args, Clone, Debug)]
pub struct GradeArgs {
    /// Pipeline config (YAML). Defaults apply when omitted.
    #[arg(long, env = "RANKGRADE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Request JSON file ({"topic","content","rubric","sampleCount"}); "-" reads stdin
    #[arg(long, conflicts_with_all = ["topic", "rubric", "content", "content_file"])]
    pub request: Option<PathBuf>,

    #[arg(long)]
    pub topic: Option<String>,

    #[arg(long)]
    pub rubric: Option<String>,

    /// Submission text
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read the submission text from a file
    #[arg(long)]
    pub content_file: Option<PathBuf>,

    /// Reference corpus size (10..=100)
    #[arg(long)]
    pub sample_count: Option<u32>,

    #[command(flatten)]
    pub judge: JudgeArgs,

    /// Override the ranking integrity mode from the config file
    #[arg(long, value_enum, env = "RANKGRADE_INTEGRITY")]
    pub integrity: Option<IntegrityArg>,

    /// Use one deadline (seconds) for every remote stage
    #[arg(long, env = "RANKGRADE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Also write the JSON response here
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Clone, Debug)]
pub struct ScoreArgs {
    /// 1-based insertion rank
    #[arg(long)]
    pub rank: u32,

    /// Corpus size
    #[arg(long)]
    pub total: u32,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone, Debug)]
pub struct InitConfigArgs {
    #[arg(long, default_value = "rankgrade.yaml")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
