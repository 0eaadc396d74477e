use serde::{Deserialize, Serialize};

/// Upper end of the score band. Scores are reported as `"<n>/25"`.
pub const MAX_SCORE: u32 = 25;
pub const MIN_SAMPLE_COUNT: u32 = 10;
pub const MAX_SAMPLE_COUNT: u32 = 100;
pub const DEFAULT_SAMPLE_COUNT: u32 = 50;
/// Length bound for a single reference text, in characters.
pub const MAX_SAMPLE_CHARS: usize = 550;

pub const SCORING_METHOD: &str = "rank-then-score";

fn default_sample_count() -> u32 {
    DEFAULT_SAMPLE_COUNT
}

/// One grading call. The submission travels as `content` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GradingRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default, rename = "content")]
    pub submission_content: String,
    #[serde(default)]
    pub rubric: String,
    #[serde(default = "default_sample_count")]
    pub sample_count: u32,
}

impl GradingRequest {
    pub fn new(
        topic: impl Into<String>,
        submission_content: impl Into<String>,
        rubric: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            submission_content: submission_content.into(),
            rubric: rubric.into(),
            sample_count: DEFAULT_SAMPLE_COUNT,
        }
    }

    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }
}

/// A synthetic calibration essay. `target_score` is the quality the generator
/// was asked to aim for; the ranker decides the actual order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSample {
    pub id: u32,
    pub target_score: u32,
    pub content: String,
}

/// Sample ids ordered worst (first) to best (last).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankedCorpus {
    pub ranked_ids: Vec<u32>,
}

impl RankedCorpus {
    /// Resolve the ranked ids back to sample texts, worst first.
    /// Ids without a matching sample are skipped.
    pub fn contents<'a>(&self, samples: &'a [ReferenceSample]) -> Vec<&'a str> {
        self.ranked_ids
            .iter()
            .filter_map(|id| samples.iter().find(|s| s.id == *id))
            .map(|s| s.content.as_str())
            .collect()
    }
}

/// Raw insertion rank that fell outside `[1, N]` and the value it was clamped to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RangeViolation {
    pub raw: i64,
    pub clamped: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InsertionVerdict {
    pub rank: u32,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_violation: Option<RangeViolation>,
}

/// Ranking defects tolerated in permissive integrity mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum IntegrityWarning {
    DuplicateId(u32),
    UnknownId(i64),
    MissingId(u32),
}

impl std::fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate id {}", id),
            Self::UnknownId(id) => write!(f, "unknown id {}", id),
            Self::MissingId(id) => write!(f, "missing id {}", id),
        }
    }
}

/// Generator returned fewer usable samples than requested.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShortCorpus {
    pub requested: u32,
    pub received: u32,
}

/// Non-fatal adjustments made while grading. Omitted from responses when empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_violation: Option<RangeViolation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub integrity_warnings: Vec<IntegrityWarning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_corpus: Option<ShortCorpus>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub renumbered_ids: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub truncated_samples: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub score: String,
    pub rank: u32,
    pub total_samples: u32,
    pub percentile: u32,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDetails {
    pub method: String,
    pub generated_samples: u32,
}

/// Success body returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GradeResponse {
    #[serde(flatten)]
    pub result: ScoreResult,
    pub score_details: ScoreDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

/// Input to one text-judge call.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    /// Output budget the caller expects to need; judges treat it as a floor
    /// over their configured limit.
    pub max_tokens: Option<u32>,
}

impl JudgeRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Raw completion text as returned by a judge. Never parsed by the judge itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_sample_count_and_maps_content() {
        let req: GradingRequest =
            serde_json::from_str(r#"{"topic":"t","content":"essay","rubric":"r"}"#).unwrap();
        assert_eq!(req.sample_count, DEFAULT_SAMPLE_COUNT);
        assert_eq!(req.submission_content, "essay");
    }

    #[test]
    fn response_flattens_result_and_hides_empty_diagnostics() {
        let resp = GradeResponse {
            result: ScoreResult {
                score: "13/25".to_string(),
                rank: 25,
                total_samples: 50,
                percentile: 50,
                reasoning: "mid".to_string(),
            },
            score_details: ScoreDetails {
                method: SCORING_METHOD.to_string(),
                generated_samples: 50,
            },
            diagnostics: None,
        };
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["score"], "13/25");
        assert_eq!(v["totalSamples"], 50);
        assert_eq!(v["scoreDetails"]["method"], "rank-then-score");
        assert_eq!(v["scoreDetails"]["generatedSamples"], 50);
        assert!(v.get("diagnostics").is_none());
    }

    #[test]
    fn diagnostics_serialize_only_populated_fields() {
        let diag = Diagnostics {
            range_violation: Some(RangeViolation {
                raw: 0,
                clamped: 1,
            }),
            ..Default::default()
        };
        assert!(!diag.is_empty());
        let v = serde_json::to_value(&diag).unwrap();
        assert_eq!(v["rangeViolation"]["raw"], 0);
        assert!(v.get("integrityWarnings").is_none());
        assert!(v.get("renumberedIds").is_none());
    }

    #[test]
    fn ranked_corpus_resolves_contents_in_order() {
        let samples = vec![
            ReferenceSample {
                id: 1,
                target_score: 5,
                content: "a".into(),
            },
            ReferenceSample {
                id: 2,
                target_score: 20,
                content: "b".into(),
            },
        ];
        let corpus = RankedCorpus {
            ranked_ids: vec![2, 1],
        };
        assert_eq!(corpus.contents(&samples), vec!["b", "a"]);
    }
}
