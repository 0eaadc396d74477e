//! The text-completion oracle consulted by the remote stages.
//!
//! Implementations return raw text only. Extracting structure from that text
//! is the calling stage's job (see `crate::extract`).

pub mod fake;
pub mod openai;
pub mod scripted;
pub mod tracing;

use crate::model::{Completion, JudgeRequest};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("outbound network blocked by policy (target={target}): {reason}")]
    NetworkBlocked { target: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("judge API error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("judge API response malformed: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    Other(String),
}

impl JudgeError {
    /// Quota and server-side failures; the caller decides whether to retry the request.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[async_trait]
pub trait TextJudge: Send + Sync {
    async fn complete(&self, request: &JudgeRequest) -> Result<Completion, JudgeError>;

    fn provider_name(&self) -> &'static str;

    fn model(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let quota = JudgeError::Status {
            status: 429,
            body: "slow down".into(),
        };
        let bad_request = JudgeError::Status {
            status: 400,
            body: "nope".into(),
        };
        assert!(quota.is_transient());
        assert!(!bad_request.is_transient());
        assert!(!JudgeError::MalformedResponse("x".into()).is_transient());
    }
}
