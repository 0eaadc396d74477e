use super::{JudgeError, TextJudge};
use crate::model::{Completion, JudgeRequest};
use crate::stages::prompt::{GENERATION_SCHEMA, INSERTION_SCHEMA, RANKING_SCHEMA};
use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Deterministic offline judge.
///
/// Answers each stage from the prompt it receives: generation follows the
/// target plan in the prompt, ranking returns ids ascending, insertion places
/// the submission at `position` (0.0 worst .. 1.0 best) of the corpus.
#[derive(Debug)]
pub struct FakeJudge {
    model: String,
    position: f64,
    fixed_response: Option<String>,
    calls: AtomicUsize,
}

impl FakeJudge {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            position: 0.5,
            fixed_response: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_position(mut self, position: f64) -> Self {
        self.position = position.clamp(0.0, 1.0);
        self
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn generate(&self, user: &str) -> String {
        let samples: Vec<_> = plan_re()
            .captures_iter(user)
            .filter_map(|c| {
                let id: u32 = c[1].parse().ok()?;
                let target: u32 = c[2].parse().ok()?;
                Some(json!({
                    "id": id,
                    "targetScore": target,
                    "content": format!(
                        "Reference essay {} written at roughly {} points of quality.",
                        id, target
                    ),
                }))
            })
            .collect();
        format!("```json\n{}\n```", json!({ "samples": samples }))
    }

    fn rank(&self, user: &str) -> String {
        let mut ids: Vec<u32> = corpus_id_re()
            .captures_iter(user)
            .filter_map(|c| c[1].parse().ok())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        json!({ "rankedIds": ids }).to_string()
    }

    fn insert(&self, user: &str) -> String {
        let total = position_re().captures_iter(user).count().max(1);
        let rank = ((self.position * total as f64).round() as usize).clamp(1, total);
        json!({
            "rank": rank,
            "reasoning": format!("Placed at position {} of {} by the offline judge.", rank, total),
        })
        .to_string()
    }
}

fn plan_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^- id (\d+): target (\d+)/").expect("plan regex is valid"))
}

fn corpus_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\[id=(\d+)\]").expect("id regex is valid"))
}

fn position_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\[position \d+\]").expect("position regex is valid"))
}

#[async_trait]
impl TextJudge for FakeJudge {
    async fn complete(&self, request: &JudgeRequest) -> Result<Completion, JudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let text = if let Some(fixed) = &self.fixed_response {
            fixed.clone()
        } else if request.system.contains(GENERATION_SCHEMA) {
            self.generate(&request.user)
        } else if request.system.contains(RANKING_SCHEMA) {
            self.rank(&request.user)
        } else if request.system.contains(INSERTION_SCHEMA) {
            self.insert(&request.user)
        } else {
            return Err(JudgeError::Other(
                "fake judge received a prompt it does not recognise".into(),
            ));
        };

        Ok(Completion {
            text,
            provider: "fake".to_string(),
            model: self.model.clone(),
            meta: json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
