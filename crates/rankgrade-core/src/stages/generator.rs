use super::prompt;
use crate::errors::StageError;
use crate::extract::{as_integer, extract_json_with_keys, field, salvage_array_items, ExtractError};
use crate::model::{JudgeRequest, ReferenceSample, ShortCorpus, MAX_SCORE};
use crate::providers::judge::TextJudge;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct GenerationParams<'a> {
    pub topic: &'a str,
    pub rubric: &'a str,
    pub sample_count: u32,
    pub temperature: f32,
    pub max_sample_chars: usize,
}

/// Reference corpus plus the adjustments made while normalising it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCorpus {
    pub samples: Vec<ReferenceSample>,
    pub short_corpus: Option<ShortCorpus>,
    pub renumbered_ids: bool,
    pub truncated_samples: u32,
}

/// Largest completion most chat models accept in one response.
pub const GENERATION_TOKEN_CEILING: u32 = 16_384;

/// Output tokens needed for `n` samples of up to `max_chars` characters each.
///
/// CJK text runs close to one token per character; JSON framing and the
/// target score add roughly 40 tokens per sample.
pub fn generation_token_budget(n: u32, max_chars: usize) -> u32 {
    let per_sample = max_chars as u64 + 40;
    (u64::from(n) * per_sample).min(u64::from(GENERATION_TOKEN_CEILING)) as u32
}

/// Bell-shaped target scores for `n` essays, non-decreasing, within `[1, max]`.
///
/// Quantiles of a normal with mean `max/2` and sd `max/5`, using the
/// logistic approximation `z = ln(p / (1 - p)) / 1.702`.
pub fn target_distribution(n: u32, max: u32) -> Vec<u32> {
    let mean = f64::from(max) / 2.0;
    let sd = f64::from(max) / 5.0;
    (0..n)
        .map(|i| {
            let p = (f64::from(i) + 0.5) / f64::from(n);
            let z = (p / (1.0 - p)).ln() / 1.702;
            (mean + z * sd).round().clamp(1.0, f64::from(max)) as u32
        })
        .collect()
}

pub async fn generate_samples(
    judge: &dyn TextJudge,
    params: &GenerationParams<'_>,
) -> Result<GeneratedCorpus, StageError> {
    let targets = target_distribution(params.sample_count, MAX_SCORE);
    let request = JudgeRequest::new(
        prompt::generation_system(),
        prompt::generation_user(params.topic, params.rubric, &targets, params.max_sample_chars),
        params.temperature,
    )
    .with_max_tokens(generation_token_budget(
        params.sample_count,
        params.max_sample_chars,
    ));

    let completion = judge
        .complete(&request)
        .await
        .map_err(|e| StageError::upstream(judge.provider_name(), e))?;

    let corpus = parse_samples(&completion.text, &targets, params.max_sample_chars)?;
    tracing::debug!(
        requested = params.sample_count,
        received = corpus.samples.len(),
        "reference corpus generated"
    );
    Ok(corpus)
}

/// Turn generator output into a normalised corpus of at most `targets.len()` samples.
///
/// Output cut off mid-array keeps its complete samples; the shortfall is
/// then reported as a short corpus.
pub fn parse_samples(
    text: &str,
    targets: &[u32],
    max_chars: usize,
) -> Result<GeneratedCorpus, ExtractError> {
    let value = match extract_json_with_keys(text, &["samples"], true) {
        Ok(value) => value,
        Err(err @ ExtractError::Unbalanced(_)) => {
            let items = salvage_array_items(text, "samples");
            if items.is_empty() {
                return Err(err);
            }
            tracing::warn!(
                salvaged = items.len(),
                "generator output was cut off; keeping the complete samples"
            );
            serde_json::Value::Array(items)
        }
        Err(err) => return Err(err),
    };
    let items = match &value {
        serde_json::Value::Array(items) => items,
        other => field(other, &["samples"])
            .ok_or(ExtractError::MissingField("samples"))?
            .as_array()
            .ok_or_else(|| ExtractError::schema("samples", "expected an array"))?,
    };
    if items.is_empty() {
        return Err(ExtractError::schema("samples", "array is empty"));
    }

    let requested = targets.len();
    let mut raw_ids = Vec::new();
    let mut samples = Vec::new();
    let mut truncated_samples = 0u32;

    for item in items {
        let content = field(item, &["content", "text", "essay"])
            .and_then(|v| v.as_str())
            .map(str::trim)
            .unwrap_or_default();
        if content.is_empty() {
            continue;
        }
        if samples.len() == requested {
            tracing::warn!(requested, "generator returned more samples than requested; extra samples dropped");
            break;
        }

        let content = if content.chars().count() > max_chars {
            truncated_samples += 1;
            content.chars().take(max_chars).collect()
        } else {
            content.to_string()
        };

        let position = samples.len();
        let planned = targets.get(position).copied().unwrap_or(MAX_SCORE / 2);
        let target_score = field(item, &["targetScore", "target_score", "score"])
            .and_then(as_integer)
            .map(|t| t.clamp(0, i64::from(MAX_SCORE)) as u32)
            .unwrap_or(planned);

        raw_ids.push(field(item, &["id"]).and_then(as_integer));
        samples.push(ReferenceSample {
            id: position as u32 + 1,
            target_score,
            content,
        });
    }

    if samples.is_empty() {
        return Err(ExtractError::schema(
            "samples",
            "no sample has non-empty content",
        ));
    }

    let renumbered_ids = !ids_are_one_to_k(&raw_ids);
    if renumbered_ids {
        tracing::warn!("generator ids were missing, duplicated or out of range; renumbered by position");
    } else {
        for (sample, id) in samples.iter_mut().zip(&raw_ids) {
            if let Some(id) = id {
                sample.id = *id as u32;
            }
        }
    }

    if truncated_samples > 0 {
        tracing::warn!(truncated_samples, max_chars, "reference texts truncated to length bound");
    }

    let short_corpus = (samples.len() < requested).then(|| {
        tracing::warn!(
            requested,
            received = samples.len(),
            "generator returned fewer samples than requested; grading against the smaller corpus"
        );
        ShortCorpus {
            requested: requested as u32,
            received: samples.len() as u32,
        }
    });

    Ok(GeneratedCorpus {
        samples,
        short_corpus,
        renumbered_ids,
        truncated_samples,
    })
}

fn ids_are_one_to_k(raw: &[Option<i64>]) -> bool {
    let k = raw.len() as i64;
    let mut seen = HashSet::new();
    raw.iter().all(|id| match id {
        Some(id) if (1..=k).contains(id) => seen.insert(*id),
        _ => false,
    })
}
