use super::{JudgeError, TextJudge};
use crate::model::{Completion, JudgeRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One queued judge behaviour.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Reply(String),
    Fail(String),
    /// Sleep before replying; used to exercise stage timeouts and cancellation.
    Delayed(Duration, String),
}

/// Test double that replays queued steps in order and records every request.
#[derive(Debug, Default)]
pub struct ScriptedJudge {
    steps: Mutex<VecDeque<ScriptStep>>,
    requests: Mutex<Vec<JudgeRequest>>,
}

impl ScriptedJudge {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replies<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self::new(replies.into_iter().map(|r| ScriptStep::Reply(r.into())))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn requests(&self) -> Vec<JudgeRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl TextJudge for ScriptedJudge {
    async fn complete(&self, request: &JudgeRequest) -> Result<Completion, JudgeError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let step = self
            .steps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| JudgeError::Other("no more scripted responses".into()))?;

        let text = match step {
            ScriptStep::Reply(text) => text,
            ScriptStep::Fail(message) => return Err(JudgeError::Other(message)),
            ScriptStep::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                text
            }
        };

        Ok(Completion {
            text,
            provider: "scripted".to_string(),
            model: "scripted".to_string(),
            meta: serde_json::Value::Null,
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
