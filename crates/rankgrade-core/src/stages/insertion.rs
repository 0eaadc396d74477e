use super::prompt;
use crate::errors::StageError;
use crate::extract::{as_integer, extract_json_with_keys, field, ExtractError};
use crate::model::{InsertionVerdict, JudgeRequest, RangeViolation};
use crate::providers::judge::TextJudge;

#[derive(Debug, Clone)]
pub struct InsertionParams<'a> {
    pub topic: &'a str,
    pub rubric: &'a str,
    pub submission: &'a str,
    pub temperature: f32,
}

/// Place the submission within `ordered` (reference texts, worst first).
///
/// `ordered` must be non-empty. The returned rank is always within
/// `[1, ordered.len()]`; out-of-range judge output is clamped and recorded.
pub async fn insert_submission(
    judge: &dyn TextJudge,
    params: &InsertionParams<'_>,
    ordered: &[&str],
) -> Result<InsertionVerdict, StageError> {
    let request = JudgeRequest::new(
        prompt::insertion_system(),
        prompt::insertion_user(params.topic, params.rubric, params.submission, ordered),
        params.temperature,
    );

    let completion = judge
        .complete(&request)
        .await
        .map_err(|e| StageError::upstream(judge.provider_name(), e))?;

    parse_verdict(&completion.text, ordered.len() as u32).map_err(StageError::from)
}

const RANK_KEYS: [&str; 4] = ["rank", "position", "insertionRank", "insertion_rank"];

pub fn parse_verdict(text: &str, total: u32) -> Result<InsertionVerdict, ExtractError> {
    let value = extract_json_with_keys(text, &RANK_KEYS, false)?;
    let raw_rank = field(&value, &RANK_KEYS)
        .ok_or(ExtractError::MissingField("rank"))?;
    let raw = as_integer(raw_rank)
        .ok_or_else(|| ExtractError::schema("rank", format!("not an integer: {}", raw_rank)))?;

    let reasoning = field(&value, &["reasoning", "reason", "rationale"])
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .trim()
        .to_string();

    let (rank, range_violation) = clamp_rank(raw, total);
    if let Some(violation) = &range_violation {
        tracing::warn!(
            raw = violation.raw,
            clamped = violation.clamped,
            total,
            "insertion rank out of range; clamped"
        );
    }

    Ok(InsertionVerdict {
        rank,
        reasoning,
        range_violation,
    })
}

/// Clamp `raw` into `[1, total]`, reporting the violation if one occurred.
pub fn clamp_rank(raw: i64, total: u32) -> (u32, Option<RangeViolation>) {
    let upper = i64::from(total.max(1));
    let clamped = raw.clamp(1, upper) as u32;
    if i64::from(clamped) == raw {
        (clamped, None)
    } else {
        (clamped, Some(RangeViolation { raw, clamped }))
    }
}
