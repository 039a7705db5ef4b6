//! 照合パイプライン
//!
//! 2パス構成:
//! 1. ペア単位のパス（並列）: 候補生成 → 類似度 → ゲート
//! 2. バッチ統計のパス: 通過ペア全体の発行年範囲 → 発行年差 → カバー比較 → 合成スコア → ランキング
//!
//! 途中結果は出力しない。最後まで完了するか、エラーで中断するかのどちらか。

pub mod candidates;
pub mod gate;
pub mod rank;
pub mod similarity;
pub mod types;

pub use candidates::generate_candidates;
pub use gate::{Gate, Weights, YearRange};
pub use similarity::SimilarityEngine;
pub use types::{
    CandidatePair, GatedCandidate, GatedPair, MatchResult, MatchRow, MatchSummary, ScoredPair,
};

use crate::config::Config;
use crate::cover::{score_covers, CoverScore, FailureKind, ImageResolver};
use crate::error::{BiblinkError, Result};
use biblink_common::Record;
use indicatif::ProgressBar;
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info};

/// CPU負荷の高い処理を実行
///
/// マルチスレッドランタイム上では `block_in_place` でワーカーを明け渡す。
/// カレントスレッドランタイム（またはランタイム外）ではそのまま実行する。
fn run_cpu_bound<R>(work: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

pub struct Matcher {
    config: Config,
    resolver: Option<Arc<ImageResolver>>,
    progress: Option<ProgressBar>,
}

impl Matcher {
    /// カバー画像比較ありの照合器
    pub fn new(config: Config, resolver: Arc<ImageResolver>) -> Result<Self> {
        config.validate()?;
        let resolver = if config.skip_covers { None } else { Some(resolver) };
        Ok(Self {
            config,
            resolver,
            progress: None,
        })
    }

    /// カバー画像比較なしの照合器（カバー項は常にフォールバック値）
    pub fn without_covers(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            resolver: None,
            progress: None,
        })
    }

    /// カバー画像取得の進捗表示
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run(&self, left: &[Record], right: &[Record]) -> Result<MatchResult> {
        let mut summary = MatchSummary {
            left_records: left.len(),
            right_records: right.len(),
            ..Default::default()
        };

        // パス1: ペア単位（N×M、CPUのみ）
        let engine = SimilarityEngine::new(self.config.normalize_titles);
        let gate = Gate::from_config(&self.config);
        let survivors = run_cpu_bound(|| {
            let candidates = generate_candidates(left, right);
            summary.total_candidates = candidates.len();
            debug!(candidates = candidates.len(), "Generated candidate pairs");

            gate.apply(engine.score_all(candidates), &mut summary)
        });
        let gated_candidates: Vec<GatedCandidate> =
            survivors.iter().map(GatedCandidate::from_scored).collect();
        info!(
            total = summary.total_candidates,
            gated_in = summary.gated_in,
            "Gating complete"
        );

        // パス2: 通過ペア全体の統計が必要
        let year_range = YearRange::from_pairs(&survivors);
        summary.year_range = year_range.map(|r| (r.min, r.max));
        summary.missing_year_pairs = survivors
            .iter()
            .filter(|p| p.signals.years.0.is_none() || p.signals.years.1.is_none())
            .count();

        let covers = self.cover_scores(&survivors).await?;
        if covers.len() != survivors.len() {
            return Err(BiblinkError::InvariantViolation(format!(
                "カバー比較結果の件数が一致しません: {} != {}",
                covers.len(),
                survivors.len()
            )));
        }

        let weights = Weights::from_config(&self.config);
        let policy = self.config.cover_failure_policy;
        let mut gated = Vec::with_capacity(survivors.len());
        for (pair, cover) in survivors.into_iter().zip(covers) {
            summary.record_cover(&cover);
            gated.push(gate::finalize(pair, year_range.as_ref(), cover, &weights, policy)?);
        }

        if let Some(resolver) = &self.resolver {
            summary.image_fetches = resolver.fetch_count();
            let failures = resolver.cache().failure_counts();
            summary.failed_cover_urls_transient =
                failures.get(&FailureKind::Transient).copied().unwrap_or(0);
            summary.failed_cover_urls_permanent =
                failures.get(&FailureKind::Permanent).copied().unwrap_or(0);
        }

        let rows = rank::rank(gated);
        info!(
            matches = rows.len(),
            cover_fallbacks = summary.cover_fallbacks(),
            "Matching complete"
        );

        Ok(MatchResult {
            rows,
            gated: gated_candidates,
            summary,
        })
    }

    async fn cover_scores(&self, survivors: &[ScoredPair<'_>]) -> Result<Vec<CoverScore>> {
        let resolver = match &self.resolver {
            Some(resolver) => Arc::clone(resolver),
            None => return Ok(vec![CoverScore::unavailable(None); survivors.len()]),
        };

        let urls: Vec<(Option<String>, Option<String>)> = survivors
            .iter()
            .map(|p| {
                (
                    p.pair.left.record.cover_image_url.clone(),
                    p.pair.right.record.cover_image_url.clone(),
                )
            })
            .collect();

        score_covers(resolver, &urls, self.progress.clone()).await
    }
}
