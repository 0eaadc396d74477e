//! Orchestrator for one grading request.
//!
//! Runs validation, generation, ranking, insertion and scoring strictly in
//! sequence. Each remote stage runs under its own deadline and the caller's
//! cancellation token; the first failure ends the run with a stage-tagged
//! [`GradingError`] and no partial result. Nothing is retried here.

pub mod state;
pub mod validate;

use crate::config::PipelineConfig;
use crate::errors::{GradingError, Stage, StageError};
use crate::model::{
    Diagnostics, GradeResponse, GradingRequest, ScoreDetails, ScoreResult, SCORING_METHOD,
};
use crate::providers::judge::TextJudge;
use crate::score::score_verdict;
use crate::stages::{
    generate_samples, insert_submission, rank_samples, GenerationParams, InsertionParams,
    RankingParams,
};
use state::StateTrail;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

pub use state::GradingState;

/// Successful run: the score plus everything needed to explain it.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingOutcome {
    pub request_id: String,
    pub result: ScoreResult,
    pub generated_samples: u32,
    pub diagnostics: Diagnostics,
    pub states: Vec<GradingState>,
}

impl GradingOutcome {
    pub fn to_response(&self) -> GradeResponse {
        GradeResponse {
            result: self.result.clone(),
            score_details: ScoreDetails {
                method: SCORING_METHOD.to_string(),
                generated_samples: self.generated_samples,
            },
            diagnostics: (!self.diagnostics.is_empty()).then(|| self.diagnostics.clone()),
        }
    }
}

/// Stateless across requests; clone freely and grade concurrently.
#[derive(Clone)]
pub struct Grader {
    judge: Arc<dyn TextJudge>,
    config: PipelineConfig,
}

impl Grader {
    pub fn new(judge: Arc<dyn TextJudge>, config: PipelineConfig) -> Self {
        Self { judge, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn grade(&self, request: &GradingRequest) -> Result<GradingOutcome, GradingError> {
        self.grade_with_cancel(request, &CancellationToken::new())
            .await
    }

    pub async fn grade_with_cancel(
        &self,
        request: &GradingRequest,
        cancel: &CancellationToken,
    ) -> Result<GradingOutcome, GradingError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "rankgrade.grade",
            request_id = %request_id,
            sample_count = request.sample_count,
            provider = self.judge.provider_name()
        );

        async move {
            let mut trail = StateTrail::start();
            match self.run(request, cancel, &mut trail).await {
                Ok((result, generated_samples, diagnostics)) => {
                    trail.advance(GradingState::Done);
                    tracing::info!(
                        score = %result.score,
                        rank = result.rank,
                        total = result.total_samples,
                        "grading complete"
                    );
                    Ok(GradingOutcome {
                        request_id,
                        result,
                        generated_samples,
                        diagnostics,
                        states: trail.into_states(),
                    })
                }
                Err(err) => {
                    trail.advance(GradingState::Failed);
                    tracing::warn!(
                        stage = %err.stage,
                        kind = %err.kind(),
                        error = %err.error,
                        "grading failed"
                    );
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &GradingRequest,
        cancel: &CancellationToken,
        trail: &mut StateTrail,
    ) -> Result<(ScoreResult, u32, Diagnostics), GradingError> {
        let cfg = &self.config;
        let judge = self.judge.as_ref();
        let mut diagnostics = Diagnostics::default();

        validate::validate_request(request)
            .map_err(|e| GradingError::new(Stage::Validating, e))?;

        trail.advance(GradingState::Generating);
        let generation = GenerationParams {
            topic: &request.topic,
            rubric: &request.rubric,
            sample_count: request.sample_count,
            temperature: cfg.temperatures.generation,
            max_sample_chars: cfg.max_sample_chars,
        };
        let generated = guarded(
            Stage::Generating,
            cfg.timeouts.generation(),
            cancel,
            generate_samples(judge, &generation),
        )
        .await?;
        diagnostics.short_corpus = generated.short_corpus;
        diagnostics.renumbered_ids = generated.renumbered_ids;
        diagnostics.truncated_samples = generated.truncated_samples;
        let samples = generated.samples;

        trail.advance(GradingState::Ranking);
        let ranking = RankingParams {
            topic: &request.topic,
            rubric: &request.rubric,
            temperature: cfg.temperatures.ranking,
            integrity: cfg.integrity,
        };
        let ranked = guarded(
            Stage::Ranking,
            cfg.timeouts.ranking(),
            cancel,
            rank_samples(judge, &ranking, &samples),
        )
        .await?;
        diagnostics.integrity_warnings = ranked.warnings;

        trail.advance(GradingState::Inserting);
        let ordered = ranked.corpus.contents(&samples);
        let total = ordered.len() as u32;
        let insertion = InsertionParams {
            topic: &request.topic,
            rubric: &request.rubric,
            submission: &request.submission_content,
            temperature: cfg.temperatures.insertion,
        };
        let verdict = guarded(
            Stage::Inserting,
            cfg.timeouts.insertion(),
            cancel,
            insert_submission(judge, &insertion, &ordered),
        )
        .await?;
        diagnostics.range_violation = verdict.range_violation;

        trail.advance(GradingState::Scoring);
        let result = score_verdict(&verdict, total);

        Ok((result, samples.len() as u32, diagnostics))
    }
}

/// Run one remote stage under its deadline and the cancellation token.
/// Cancellation drops the in-flight judge call.
async fn guarded<T, F>(
    stage: Stage,
    deadline: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, GradingError>
where
    F: Future<Output = Result<T, StageError>>,
{
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StageError::Cancelled),
        outcome = tokio::time::timeout(deadline, fut) => match outcome {
            Ok(result) => result,
            Err(_) => Err(StageError::Timeout { after: deadline }),
        },
    };
    result.map_err(|e| GradingError::new(stage, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageTimeouts;
    use crate::errors::ErrorKind;
    use crate::providers::judge::fake::FakeJudge;
    use crate::providers::judge::scripted::{ScriptStep, ScriptedJudge};

    fn request(n: u32) -> GradingRequest {
        GradingRequest::new("My dream", "I want to be a doctor.", "content 40%").with_sample_count(n)
    }

    #[tokio::test]
    async fn offline_run_visits_every_state() {
        let grader = Grader::new(
            Arc::new(FakeJudge::new("fake")),
            PipelineConfig::default(),
        );
        let outcome = grader.grade(&request(10)).await.unwrap();
        assert_eq!(
            outcome.states,
            vec![
                GradingState::Validating,
                GradingState::Generating,
                GradingState::Ranking,
                GradingState::Inserting,
                GradingState::Scoring,
                GradingState::Done,
            ]
        );
        // midpoint of 10 references
        assert_eq!(outcome.result.rank, 5);
        assert_eq!(outcome.result.score, "13/25");
        assert!(outcome.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn stage_deadline_surfaces_timeout() {
        let judge = Arc::new(ScriptedJudge::new(vec![ScriptStep::Delayed(
            Duration::from_secs(600),
            "{}".into(),
        )]));
        let mut cfg = PipelineConfig::default();
        cfg.timeouts = StageTimeouts::uniform(1);
        let err = Grader::new(judge, cfg).grade(&request(10)).await.unwrap_err();
        assert_eq!(err.stage, Stage::Generating);
        assert_eq!(err.kind(), ErrorKind::TimeoutError);
    }

    #[tokio::test]
    async fn cancelled_token_fails_without_calling_later_stages() {
        let judge = Arc::new(ScriptedJudge::replies(["never used"]));
        let grader = Grader::new(judge.clone(), PipelineConfig::default());
        let token = CancellationToken::new();
        token.cancel();
        let err = grader
            .grade_with_cancel(&request(10), &token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(err.stage, Stage::Generating);
        assert_eq!(judge.calls(), 0);
    }
}
