//! Stage-tagged failures of a grading run.

use crate::extract::ExtractError;
use crate::model::IntegrityWarning;
use crate::providers::judge::JudgeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Generating,
    Ranking,
    Inserting,
    Scoring,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Generating => "generating",
            Self::Ranking => "ranking",
            Self::Inserting => "inserting",
            Self::Scoring => "scoring",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error discriminator exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InputValidationError,
    UpstreamError,
    TimeoutError,
    ParseError,
    IntegrityError,
    Cancelled,
    /// The grader could not be built (bad config, missing credentials).
    /// Never produced by a pipeline stage.
    ConfigError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::UpstreamError => "UpstreamError",
            Self::TimeoutError => "TimeoutError",
            Self::ParseError => "ParseError",
            Self::IntegrityError => "IntegrityError",
            Self::Cancelled => "Cancelled",
            Self::ConfigError => "ConfigError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Request rejected before any judge call.
    #[error("invalid request: {0}")]
    InputValidation(String),

    /// The judge call itself failed.
    #[error("judge call failed ({provider}): {source}")]
    Upstream {
        provider: String,
        #[source]
        source: JudgeError,
    },

    /// The stage did not finish within its deadline.
    #[error("judge call timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },

    /// Judge text could not be coerced into the expected structure.
    #[error("could not parse judge output: {0}")]
    Parse(#[from] ExtractError),

    /// Ranking is not a permutation of the generated sample ids.
    #[error("ranking is not a permutation of sample ids: {}", format_warnings(.0))]
    Integrity(Vec<IntegrityWarning>),

    #[error("grading cancelled")]
    Cancelled,
}

fn format_warnings(warnings: &[IntegrityWarning]) -> String {
    warnings
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl StageError {
    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::InputValidation(detail.into())
    }

    pub fn upstream(provider: impl Into<String>, source: JudgeError) -> Self {
        Self::Upstream {
            provider: provider.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputValidation(_) => ErrorKind::InputValidationError,
            Self::Upstream { .. } => ErrorKind::UpstreamError,
            Self::Timeout { .. } => ErrorKind::TimeoutError,
            Self::Parse(_) => ErrorKind::ParseError,
            Self::Integrity(_) => ErrorKind::IntegrityError,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Terminal failure of a grading run: the stage that failed and why.
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {error}")]
pub struct GradingError {
    pub stage: Stage,
    #[source]
    pub error: StageError,
}

impl GradingError {
    pub fn new(stage: Stage, error: StageError) -> Self {
        Self { stage, error }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorBody {
                message: self.to_string(),
                kind: self.kind(),
                stage: Some(self.stage),
            },
        }
    }
}

/// Failure body returned to callers. Carries no partial result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    /// Envelope for a request that could not be read or decoded at all.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                kind: ErrorKind::InputValidationError,
                stage: Some(Stage::Validating),
            },
        }
    }

    /// Envelope for a grader that could not be set up; no stage ran.
    pub fn config(message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                kind: ErrorKind::ConfigError,
                stage: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: String,
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
}
