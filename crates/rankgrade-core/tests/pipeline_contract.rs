//! Orchestrator contract: stage ordering, failure attribution, clamping and
//! corpus consistency, exercised through scripted and fake judges.

use rankgrade_core::config::{IntegrityMode, PipelineConfig, StageTimeouts};
use rankgrade_core::errors::ErrorKind;
use rankgrade_core::model::IntegrityWarning;
use rankgrade_core::providers::judge::fake::FakeJudge;
use rankgrade_core::providers::judge::scripted::{ScriptStep, ScriptedJudge};
use rankgrade_core::{Grader, GradingRequest, GradingState, Stage};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

fn corpus_json(n: u32) -> String {
    let samples: Vec<_> = (1..=n)
        .map(|id| {
            json!({
                "id": id,
                "targetScore": (id * 25 / n).max(1),
                "content": format!("SAMPLE-{:03} reference text", id),
            })
        })
        .collect();
    json!({ "samples": samples }).to_string()
}

fn ranking_json(ids: &[u32]) -> String {
    json!({ "rankedIds": ids }).to_string()
}

fn verdict_json(rank: i64) -> String {
    json!({ "rank": rank, "reasoning": "scripted verdict" }).to_string()
}

fn request(n: u32) -> GradingRequest {
    GradingRequest::new("My dream", "I want to be a doctor.", "content 40%, structure 30%")
        .with_sample_count(n)
}

fn grader(judge: Arc<ScriptedJudge>) -> Grader {
    Grader::new(judge, PipelineConfig::default())
}

#[tokio::test]
async fn chinese_essay_offline_round_trip() {
    let judge = Arc::new(FakeJudge::new("fake"));
    let grader = Grader::new(judge.clone(), PipelineConfig::default());
    let req = GradingRequest::new(
        "我的夢想",
        "我的夢想是成為一名醫生，幫助有需要的人。",
        "內容 40%，結構 30%，文字 30%",
    )
    .with_sample_count(20);

    let outcome = grader.grade(&req).await.unwrap();
    let r = &outcome.result;
    assert!((1..=20).contains(&r.rank));
    assert_eq!(r.total_samples, 20);
    let expected = (f64::from(r.rank) / 20.0 * 25.0).round() as u32;
    assert_eq!(r.score, format!("{}/25", expected));
    assert_eq!(judge.calls(), 3);

    let v = serde_json::to_value(outcome.to_response()).unwrap();
    assert_eq!(v["scoreDetails"]["method"], "rank-then-score");
    assert_eq!(v["scoreDetails"]["generatedSamples"], 20);
    assert_eq!(v["totalSamples"], 20);
}

#[tokio::test]
async fn invalid_sample_counts_make_no_judge_calls() {
    for n in [5, 150] {
        let judge = Arc::new(ScriptedJudge::new(vec![]));
        let err = grader(judge.clone()).grade(&request(n)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputValidationError, "n={}", n);
        assert_eq!(err.stage, Stage::Validating);
        assert_eq!(judge.calls(), 0, "n={}", n);
    }
}

#[tokio::test]
async fn blank_fields_are_rejected_together() {
    let judge = Arc::new(ScriptedJudge::new(vec![]));
    let req = GradingRequest::new("", "  ", "");
    let err = grader(judge.clone()).grade(&req).await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("'topic'"));
    assert!(msg.contains("'content'"));
    assert!(msg.contains("'rubric'"));
    assert_eq!(judge.calls(), 0);
}

#[tokio::test]
async fn out_of_range_insertion_ranks_are_clamped() {
    let ids: Vec<u32> = (1..=50).collect();
    for (raw, rank, score) in [(0, 1, "1/25"), (999, 50, "25/25")] {
        let judge = Arc::new(ScriptedJudge::replies([
            corpus_json(50),
            ranking_json(&ids),
            verdict_json(raw),
        ]));
        let outcome = grader(judge).grade(&request(50)).await.unwrap();
        assert_eq!(outcome.result.rank, rank);
        assert_eq!(outcome.result.score, score);

        let violation = outcome.diagnostics.range_violation.unwrap();
        assert_eq!(violation.raw, raw);
        assert_eq!(violation.clamped, rank);

        let v = serde_json::to_value(outcome.to_response()).unwrap();
        assert_eq!(v["diagnostics"]["rangeViolation"]["raw"], raw);
    }
}

#[tokio::test]
async fn insertion_sees_corpus_in_ranked_order() {
    let reversed: Vec<u32> = (1..=10).rev().collect();
    let judge = Arc::new(ScriptedJudge::replies([
        corpus_json(10),
        ranking_json(&reversed),
        verdict_json(4),
    ]));
    let outcome = grader(judge.clone()).grade(&request(10)).await.unwrap();
    assert_eq!(outcome.result.rank, 4);
    assert_eq!(outcome.result.total_samples, 10);

    let requests = judge.requests();
    assert_eq!(requests.len(), 3);
    let insertion = &requests[2].user;
    let first = insertion.find("SAMPLE-010").unwrap();
    let last = insertion.find("SAMPLE-001").unwrap();
    assert!(first < last, "worst-ranked sample must come first");
    for id in 1..=10 {
        assert!(insertion.contains(&format!("SAMPLE-{:03}", id)));
    }
    assert!(requests[1].user.contains("SAMPLE-007"));
}

#[tokio::test]
async fn strict_integrity_fails_ranking_before_insertion() {
    let mut ids: Vec<u32> = (1..=10).collect();
    ids[9] = 3;
    let judge = Arc::new(ScriptedJudge::replies([
        corpus_json(10),
        ranking_json(&ids),
        verdict_json(5),
    ]));
    let err = grader(judge.clone()).grade(&request(10)).await.unwrap_err();
    assert_eq!(err.stage, Stage::Ranking);
    assert_eq!(err.kind(), ErrorKind::IntegrityError);
    assert_eq!(judge.calls(), 2);
}

#[tokio::test]
async fn permissive_integrity_repairs_and_reports() {
    let mut ids: Vec<u32> = (1..=10).collect();
    ids[9] = 3;
    let judge = Arc::new(ScriptedJudge::replies([
        corpus_json(10),
        ranking_json(&ids),
        verdict_json(5),
    ]));
    let mut cfg = PipelineConfig::default();
    cfg.integrity = IntegrityMode::Permissive;

    let outcome = Grader::new(judge.clone(), cfg)
        .grade(&request(10))
        .await
        .unwrap();
    assert_eq!(outcome.result.total_samples, 10);
    assert_eq!(
        outcome.diagnostics.integrity_warnings,
        vec![
            IntegrityWarning::DuplicateId(3),
            IntegrityWarning::MissingId(10)
        ]
    );
    let insertion = &judge.requests()[2].user;
    assert!(insertion.contains("SAMPLE-010"));
}

#[tokio::test]
async fn short_corpus_proceeds_with_actual_size() {
    let ids: Vec<u32> = (1..=8).collect();
    let judge = Arc::new(ScriptedJudge::replies([
        corpus_json(8),
        ranking_json(&ids),
        verdict_json(8),
    ]));
    let outcome = grader(judge).grade(&request(10)).await.unwrap();
    assert_eq!(outcome.result.total_samples, 8);
    assert_eq!(outcome.result.score, "25/25");
    assert_eq!(outcome.generated_samples, 8);
    let short = outcome.diagnostics.short_corpus.unwrap();
    assert_eq!((short.requested, short.received), (10, 8));
}

#[tokio::test]
async fn failures_are_attributed_to_their_stage() {
    let ids: Vec<u32> = (1..=10).collect();

    let judge = Arc::new(ScriptedJudge::new(vec![ScriptStep::Fail(
        "503 upstream".into(),
    )]));
    let err = grader(judge).grade(&request(10)).await.unwrap_err();
    assert_eq!((err.stage, err.kind()), (Stage::Generating, ErrorKind::UpstreamError));

    let judge = Arc::new(ScriptedJudge::replies([corpus_json(10), "I refuse".to_string()]));
    let err = grader(judge).grade(&request(10)).await.unwrap_err();
    assert_eq!((err.stage, err.kind()), (Stage::Ranking, ErrorKind::ParseError));

    let judge = Arc::new(ScriptedJudge::replies([
        corpus_json(10),
        ranking_json(&ids),
        r#"{"reasoning": "no rank given"}"#.to_string(),
    ]));
    let err = grader(judge).grade(&request(10)).await.unwrap_err();
    assert_eq!((err.stage, err.kind()), (Stage::Inserting, ErrorKind::ParseError));

    let judge = Arc::new(ScriptedJudge::replies([r#"{"samples": []}"#]));
    let err = grader(judge).grade(&request(10)).await.unwrap_err();
    assert_eq!((err.stage, err.kind()), (Stage::Generating, ErrorKind::ParseError));

    let envelope = serde_json::to_value(err.to_envelope()).unwrap();
    assert_eq!(envelope["error"]["kind"], "ParseError");
    assert_eq!(envelope["error"]["stage"], "generating");
}

#[tokio::test]
async fn slow_ranking_times_out() {
    let judge = Arc::new(ScriptedJudge::new(vec![
        ScriptStep::Reply(corpus_json(10)),
        ScriptStep::Delayed(Duration::from_secs(300), ranking_json(&[1])),
    ]));
    let mut cfg = PipelineConfig::default();
    cfg.timeouts = StageTimeouts::uniform(1);

    let err = Grader::new(judge.clone(), cfg)
        .grade(&request(10))
        .await
        .unwrap_err();
    assert_eq!(err.stage, Stage::Ranking);
    assert_eq!(err.kind(), ErrorKind::TimeoutError);
    assert!(err.to_string().contains("timed out after 1s"));
    assert_eq!(judge.calls(), 2);
}

#[tokio::test]
async fn concurrent_requests_share_one_grader() {
    let grader = Grader::new(
        Arc::new(FakeJudge::new("fake").with_position(1.0)),
        PipelineConfig::default(),
    );
    let (small, large) = (request(10), request(40));
    let (a, b) = tokio::join!(grader.grade(&small), grader.grade(&large));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.result.total_samples, 10);
    assert_eq!(b.result.total_samples, 40);
    assert_eq!(a.result.score, "25/25");
    assert_ne!(a.request_id, b.request_id);
    assert_eq!(a.states.last(), Some(&GradingState::Done));
}

#[tokio::test]
async fn cancelling_mid_generation_stops_before_the_deadline() {
    let judge = Arc::new(ScriptedJudge::new(vec![
        ScriptStep::Delayed(Duration::from_secs(30), corpus_json(10)),
        ScriptStep::Reply(ranking_json(&(1..=10).collect::<Vec<_>>())),
        ScriptStep::Reply(verdict_json(5)),
    ]));
    let grader = grader(judge.clone());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = grader
        .grade_with_cancel(&request(10), &cancel)
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(err.stage, Stage::Generating);
    assert_eq!(judge.calls(), 1);
}
