//! Rank -> score mapping. Pure; no I/O, no randomness.
//!
//! `numerator = round(rank / N * 25)`, `percentile = round(rank / N * 100)`,
//! rounding half up. Computed in integers so equal inputs give equal outputs
//! on every platform.
//!
//! Callers guarantee `1 <= rank <= total` and `total > 0`.

use crate::model::{InsertionVerdict, ScoreResult, MAX_SCORE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreCard {
    pub numerator: u32,
    pub max: u32,
    pub percentile: u32,
}

impl ScoreCard {
    /// `"<numerator>/<max>"`, e.g. `"13/25"`.
    pub fn display(&self) -> String {
        format!("{}/{}", self.numerator, self.max)
    }
}

fn round_scaled(rank: u32, total: u32, scale: u32) -> u32 {
    debug_assert!(total > 0, "score mapping requires a non-empty corpus");
    let (rank, total, scale) = (u64::from(rank), u64::from(total.max(1)), u64::from(scale));
    ((2 * rank * scale + total) / (2 * total)) as u32
}

pub fn map_rank(rank: u32, total: u32) -> ScoreCard {
    ScoreCard {
        numerator: round_scaled(rank, total, MAX_SCORE),
        max: MAX_SCORE,
        percentile: round_scaled(rank, total, 100),
    }
}

pub fn score_verdict(verdict: &InsertionVerdict, total: u32) -> ScoreResult {
    let card = map_rank(verdict.rank, total);
    ScoreResult {
        score: card.display(),
        rank: verdict.rank,
        total_samples: total,
        percentile: card.percentile,
        reasoning: verdict.reasoning.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_rounds_half_up() {
        let card = map_rank(25, 50);
        assert_eq!(card.display(), "13/25");
        assert_eq!(card.percentile, 50);
    }

    #[test]
    fn top_and_bottom_of_corpus() {
        let top = map_rank(50, 50);
        assert_eq!(top.display(), "25/25");
        assert_eq!(top.percentile, 100);

        let bottom = map_rank(1, 50);
        assert_eq!(bottom.display(), "1/25");
        assert_eq!(bottom.percentile, 2);
    }

    #[test]
    fn small_corpus_values() {
        // 7/20*25 = 8.75, 7/20*100 = 35
        let card = map_rank(7, 20);
        assert_eq!(card.numerator, 9);
        assert_eq!(card.percentile, 35);
        // 1/100*25 = 0.25 rounds down to 0
        assert_eq!(map_rank(1, 100).numerator, 0);
        assert_eq!(map_rank(1, 100).percentile, 1);
    }

    #[test]
    fn score_result_carries_verdict() {
        let verdict = InsertionVerdict {
            rank: 10,
            reasoning: "solid structure".into(),
            range_violation: None,
        };
        let result = score_verdict(&verdict, 20);
        assert_eq!(result.score, "13/25");
        assert_eq!(result.rank, 10);
        assert_eq!(result.total_samples, 20);
        assert_eq!(result.percentile, 50);
        assert_eq!(result.reasoning, "solid structure");
    }
}
