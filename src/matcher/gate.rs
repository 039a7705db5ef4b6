//! ゲートとスコアリング
//!
//! ペアの状態遷移: 生成 → 類似度計算 → {不通過 | 通過} → (合成スコア | 破棄)
//!
//! 1. ゲート: タイトル距離・著者距離が閾値未満、かつ言語一致
//! 2. 発行年差の正規化: 通過ペア全体の最小/最大年が必要なため、全ペアのゲート判定後に行う
//! 3. 合成スコア: 重み付き和（小さいほど良い一致）

use super::types::{GatedPair, MatchSummary, ScoredPair, SimilaritySignals};
use crate::config::{Config, CoverFailurePolicy};
use crate::cover::CoverScore;
use crate::error::{BiblinkError, Result};

/// 閾値ゲート
#[derive(Debug, Clone, Copy)]
pub struct Gate {
    pub title_threshold: f64,
    pub author_threshold: f64,
}

/// ゲート判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateVerdict {
    pub title_failed: bool,
    pub author_failed: bool,
    pub language_failed: bool,
}

impl GateVerdict {
    pub fn passed(&self) -> bool {
        !(self.title_failed || self.author_failed || self.language_failed)
    }
}

impl Gate {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title_threshold: config.title_threshold,
            author_threshold: config.author_threshold,
        }
    }

    pub fn evaluate(&self, signals: &SimilaritySignals) -> GateVerdict {
        GateVerdict {
            title_failed: !(signals.title_distance < self.title_threshold),
            author_failed: !(signals.author_distance < self.author_threshold),
            language_failed: !signals.language_match,
        }
    }

    /// 通過したペアのみを生成順のまま返す。不通過ペアは破棄
    pub fn apply<'a>(
        &self,
        scored: Vec<ScoredPair<'a>>,
        summary: &mut MatchSummary,
    ) -> Vec<ScoredPair<'a>> {
        let mut survivors = Vec::new();

        for pair in scored {
            let verdict = self.evaluate(&pair.signals);
            if verdict.passed() {
                survivors.push(pair);
                continue;
            }

            summary.rejected += 1;
            summary.rejected_title += verdict.title_failed as usize;
            summary.rejected_author += verdict.author_failed as usize;
            summary.rejected_language += verdict.language_failed as usize;
        }

        summary.gated_in = survivors.len();
        survivors
    }
}

/// ゲート通過ペアで観測された発行年の範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    /// 通過ペアの両側の発行年から範囲を求める（年が1つもなければ `None`）
    pub fn from_pairs(pairs: &[ScoredPair<'_>]) -> Option<Self> {
        let mut years = pairs
            .iter()
            .flat_map(|p| [p.signals.years.0, p.signals.years.1])
            .flatten();

        let first = years.next()?;
        let (min, max) = years.fold((first, first), |(min, max), y| (min.min(y), max.max(y)));
        Some(Self { min, max })
    }

    pub fn span(&self) -> i64 {
        self.max as i64 - self.min as i64
    }

    /// `|yL - yR| / (max - min)`。範囲が0、またはどちらかが欠損なら 0
    pub fn normalized_difference(&self, left: Option<i32>, right: Option<i32>) -> f64 {
        let span = self.span();
        match (left, right) {
            (Some(l), Some(r)) if span > 0 => (l as i64 - r as i64).abs() as f64 / span as f64,
            _ => 0.0,
        }
    }
}

/// 発行年差（範囲が存在しない場合は 0）
pub fn year_difference(range: Option<&YearRange>, years: (Option<i32>, Option<i32>)) -> f64 {
    range
        .map(|r| r.normalized_difference(years.0, years.1))
        .unwrap_or(0.0)
}

/// 合成スコアの重み
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub title: f64,
    pub author: f64,
    pub year: f64,
    pub cover: f64,
}

impl Weights {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.weight_title,
            author: config.weight_author,
            year: config.weight_year,
            cover: config.weight_cover,
        }
    }
}

/// 合成スコアを計算
///
/// 各項が [0, 1] に収まっていない場合はパイプラインの欠陥として中断する。
pub fn combined_score(
    weights: &Weights,
    signals: &SimilaritySignals,
    year_difference: f64,
    cover: &CoverScore,
    policy: CoverFailurePolicy,
) -> Result<f64> {
    let terms = [
        ("title_distance", signals.title_distance),
        ("author_distance", signals.author_distance),
        ("year_difference", year_difference),
        ("cover_mse", cover.mse),
    ];
    for (name, value) in terms {
        if !(0.0..=1.0).contains(&value) {
            return Err(BiblinkError::InvariantViolation(format!(
                "{} が範囲外です: {}",
                name, value
            )));
        }
    }

    let partial = weights.title * signals.title_distance
        + weights.author * signals.author_distance
        + weights.year * year_difference;

    let score = if cover.comparable || policy == CoverFailurePolicy::Zero {
        partial + weights.cover * cover.mse
    } else {
        let remaining = weights.title + weights.author + weights.year;
        if remaining > 0.0 {
            partial / remaining
        } else {
            0.0
        }
    };

    if !(0.0..=1.0 + 1e-9).contains(&score) {
        return Err(BiblinkError::InvariantViolation(format!(
            "合成スコアが範囲外です: {}",
            score
        )));
    }

    Ok(score.min(1.0))
}

/// ゲート通過ペアを確定させる
pub fn finalize<'a>(
    pair: ScoredPair<'a>,
    range: Option<&YearRange>,
    cover: CoverScore,
    weights: &Weights,
    policy: CoverFailurePolicy,
) -> Result<GatedPair<'a>> {
    let year_difference = year_difference(range, pair.signals.years);
    let combined_score = combined_score(weights, &pair.signals, year_difference, &cover, policy)?;

    Ok(GatedPair {
        pair: pair.pair,
        signals: pair.signals,
        year_difference,
        cover,
        combined_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(title: f64, author: f64, language_match: bool) -> SimilaritySignals {
        SimilaritySignals {
            title_distance: title,
            author_distance: author,
            language_match,
            years: (None, None),
        }
    }

    fn default_gate() -> Gate {
        Gate::from_config(&Config::default())
    }

    #[test]
    fn test_gate_pass() {
        assert!(default_gate().evaluate(&signals(0.59, 0.34, true)).passed());
    }

    #[test]
    fn test_gate_thresholds_are_strict() {
        let verdict = default_gate().evaluate(&signals(0.6, 0.35, true));
        assert!(verdict.title_failed);
        assert!(verdict.author_failed);
        assert!(!verdict.language_failed);
        assert!(!verdict.passed());
    }

    #[test]
    fn test_gate_language() {
        let verdict = default_gate().evaluate(&signals(0.0, 0.0, false));
        assert!(verdict.language_failed);
        assert!(!verdict.passed());
    }

    #[test]
    fn test_gate_rejects_nan() {
        assert!(!default_gate().evaluate(&signals(f64::NAN, 0.0, true)).passed());
    }

    #[test]
    fn test_year_range_normalization() {
        let range = YearRange { min: 1800, max: 2000 };
        assert!((range.normalized_difference(Some(1900), Some(1950)) - 0.25).abs() < 1e-12);
        assert_eq!(range.normalized_difference(None, Some(1950)), 0.0);
    }

    #[test]
    fn test_year_range_zero_span() {
        let range = YearRange { min: 1900, max: 1900 };
        assert_eq!(range.normalized_difference(Some(1900), Some(1900)), 0.0);
    }

    #[test]
    fn test_combined_score_example() {
        let weights = Weights::from_config(&Config::default());
        let score = combined_score(
            &weights,
            &signals(0.2, 0.1, true),
            0.0,
            &CoverScore::unavailable(None),
            CoverFailurePolicy::Zero,
        )
        .unwrap();
        assert!((score - 0.13).abs() < 1e-12);
    }

    #[test]
    fn test_combined_score_renormalize() {
        let weights = Weights::from_config(&Config::default());
        let score = combined_score(
            &weights,
            &signals(0.2, 0.1, true),
            0.0,
            &CoverScore::unavailable(None),
            CoverFailurePolicy::Renormalize,
        )
        .unwrap();
        assert!((score - 0.13 / 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_renormalize_ignored_when_comparable() {
        let weights = Weights::from_config(&Config::default());
        let score = combined_score(
            &weights,
            &signals(0.2, 0.1, true),
            0.5,
            &CoverScore::compared(0.4),
            CoverFailurePolicy::Renormalize,
        )
        .unwrap();
        assert!((score - (0.1 + 0.03 + 0.05 + 0.04)).abs() < 1e-12);
    }

    #[test]
    fn test_combined_score_rejects_out_of_range_signal() {
        let weights = Weights::from_config(&Config::default());
        let err = combined_score(
            &weights,
            &signals(f64::NAN, 0.1, true),
            0.0,
            &CoverScore::unavailable(None),
            CoverFailurePolicy::Zero,
        )
        .unwrap_err();
        assert!(matches!(err, BiblinkError::InvariantViolation(_)));
    }
}
