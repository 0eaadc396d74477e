use super::prompt;
use crate::config::IntegrityMode;
use crate::errors::StageError;
use crate::extract::{as_integer, extract_json_with_keys, field, ExtractError};
use crate::model::{IntegrityWarning, JudgeRequest, RankedCorpus, ReferenceSample};
use crate::providers::judge::TextJudge;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct RankingParams<'a> {
    pub topic: &'a str,
    pub rubric: &'a str,
    pub temperature: f32,
    pub integrity: IntegrityMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingOutcome {
    pub corpus: RankedCorpus,
    /// Defects repaired in permissive mode. Always empty in strict mode.
    pub warnings: Vec<IntegrityWarning>,
}

pub async fn rank_samples(
    judge: &dyn TextJudge,
    params: &RankingParams<'_>,
    samples: &[ReferenceSample],
) -> Result<RankingOutcome, StageError> {
    let request = JudgeRequest::new(
        prompt::ranking_system(),
        prompt::ranking_user(params.topic, params.rubric, samples),
        params.temperature,
    );

    let completion = judge
        .complete(&request)
        .await
        .map_err(|e| StageError::upstream(judge.provider_name(), e))?;

    let raw = parse_ranked_ids(&completion.text)?;
    let (corpus, warnings) = reconcile(&raw, samples);

    if warnings.is_empty() {
        return Ok(RankingOutcome {
            corpus,
            warnings,
        });
    }

    match params.integrity {
        IntegrityMode::Strict => Err(StageError::Integrity(warnings)),
        IntegrityMode::Permissive => {
            for warning in &warnings {
                tracing::warn!(%warning, "ranking integrity warning; repaired");
            }
            Ok(RankingOutcome { corpus, warnings })
        }
    }
}

const RANKING_KEYS: [&str; 3] = ["rankedIds", "ranked_ids", "ranking"];

/// Raw ids from ranker output. Accepts `rankedIds`/`ranked_ids`/`ranking`, or
/// a bare array when it is the whole reply.
pub fn parse_ranked_ids(text: &str) -> Result<Vec<i64>, ExtractError> {
    let value = extract_json_with_keys(text, &RANKING_KEYS, true)?;
    let ids = match &value {
        serde_json::Value::Array(items) => items,
        other => field(other, &RANKING_KEYS)
            .ok_or(ExtractError::MissingField("rankedIds"))?
            .as_array()
            .ok_or_else(|| ExtractError::schema("rankedIds", "expected an array"))?,
    };
    ids.iter()
        .map(|v| {
            as_integer(v)
                .ok_or_else(|| ExtractError::schema("rankedIds", format!("non-integer id {}", v)))
        })
        .collect()
}

/// Check `raw` against the generated ids and build a true permutation from it:
/// unknown and repeated ids are dropped, missing ids are appended in
/// generator order. Returns the repaired ranking and every defect found.
pub fn reconcile(raw: &[i64], samples: &[ReferenceSample]) -> (RankedCorpus, Vec<IntegrityWarning>) {
    let known: HashSet<u32> = samples.iter().map(|s| s.id).collect();
    let mut seen = HashSet::new();
    let mut ranked_ids = Vec::with_capacity(samples.len());
    let mut warnings = Vec::new();

    for &id in raw {
        match u32::try_from(id).ok().filter(|id| known.contains(id)) {
            Some(id) if seen.insert(id) => ranked_ids.push(id),
            Some(id) => warnings.push(IntegrityWarning::DuplicateId(id)),
            None => warnings.push(IntegrityWarning::UnknownId(id)),
        }
    }

    for sample in samples {
        if !seen.contains(&sample.id) {
            warnings.push(IntegrityWarning::MissingId(sample.id));
            ranked_ids.push(sample.id);
        }
    }

    (RankedCorpus { ranked_ids }, warnings)
}
