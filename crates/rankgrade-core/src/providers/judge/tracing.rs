use super::{JudgeError, TextJudge};
use crate::model::{Completion, JudgeRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info_span, Instrument};

/// Wraps a judge in a `gen_ai.client.request` span. Prompts and completions
/// are never recorded, only sizes, usage and outcome.
pub struct TracingJudge {
    inner: Arc<dyn TextJudge>,
}

impl TracingJudge {
    pub fn new(inner: Arc<dyn TextJudge>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl TextJudge for TracingJudge {
    async fn complete(&self, request: &JudgeRequest) -> Result<Completion, JudgeError> {
        let temperature = f64::from(request.temperature);
        let prompt_chars = (request.system.chars().count() + request.user.chars().count()) as u64;
        let span = info_span!(
            "gen_ai.client.request",
            "gen_ai.system" = self.inner.provider_name(),
            "gen_ai.request.model" = self.inner.model(),
            "gen_ai.request.temperature" = temperature,
            "rankgrade.prompt_chars" = prompt_chars,
            "gen_ai.response.model" = tracing::field::Empty,
            "gen_ai.usage.input_tokens" = tracing::field::Empty,
            "gen_ai.usage.output_tokens" = tracing::field::Empty,
            "rankgrade.completion_chars" = tracing::field::Empty,
            "rankgrade.latency_ms" = tracing::field::Empty,
            "error" = tracing::field::Empty,
            "error.message" = tracing::field::Empty
        );

        async move {
            let start = std::time::Instant::now();
            let result = self.inner.complete(request).await;

            let span = tracing::Span::current();
            span.record("rankgrade.latency_ms", start.elapsed().as_millis() as u64);

            match &result {
                Ok(resp) => {
                    span.record("gen_ai.response.model", resp.model.as_str());
                    span.record("rankgrade.completion_chars", resp.text.chars().count() as u64);
                    if let Some(usage) = resp.meta.get("usage") {
                        if let Some(i) = usage.get("input_tokens").and_then(|v| v.as_u64()) {
                            span.record("gen_ai.usage.input_tokens", i);
                        }
                        if let Some(o) = usage.get("output_tokens").and_then(|v| v.as_u64()) {
                            span.record("gen_ai.usage.output_tokens", o);
                        }
                    }
                }
                Err(e) => {
                    span.record("error", true);
                    span.record("error.message", e.to_string().as_str());
                }
            }

            result
        }
        .instrument(span)
        .await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}
