//! Argument types shared between commands.

use clap::ValueEnum;
use rankgrade_core::config::IntegrityMode;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    Text,
    #[default]
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum IntegrityArg {
    Strict,
    Permissive,
}

impl From<IntegrityArg> for IntegrityMode {
    fn from(arg: IntegrityArg) -> Self {
        match arg {
            IntegrityArg::Strict => IntegrityMode::Strict,
            IntegrityArg::Permissive => IntegrityMode::Permissive,
        }
    }
}

/// Judge selection. Every field overrides the matching config file value.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct JudgeArgs {
    /// Text judge backend
    /// - openai: live calls to an OpenAI-compatible endpoint
    /// - fake: deterministic offline judge (tests/dev)
    #[arg(long, env = "RANKGRADE_JUDGE")]
    pub judge: Option<String>,

    /// Judge model identifier (provider-specific), e.g. gpt-4o-mini
    #[arg(long, env = "RANKGRADE_JUDGE_MODEL")]
    pub judge_model: Option<String>,

    /// Base URL of the chat-completions API
    #[arg(long, env = "RANKGRADE_JUDGE_BASE_URL")]
    pub judge_base_url: Option<String>,

    #[arg(long, env = "RANKGRADE_JUDGE_MAX_TOKENS")]
    pub judge_max_tokens: Option<u32>,

    /// API key; falls back to OPENAI_API_KEY
    #[arg(long, env = "RANKGRADE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Where the fake judge places the submission (0.0 worst .. 1.0 best)
    #[arg(long, hide = true, env = "RANKGRADE_FAKE_POSITION")]
    pub fake_position: Option<f64>,
}
