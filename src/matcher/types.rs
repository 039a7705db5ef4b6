//! 照合パイプラインの型定義
//!
//! ペアは段階ごとに別の型になる:
//! - CandidatePair: 生成直後
//! - ScoredPair: 類似度計算済み（ゲート前）
//! - GatedPair: ゲート通過・合成スコア計算済み
//! - GatedCandidate: ゲート通過直後の記録（発行年差・カバー比較の前）
//! - MatchRow: 出力行（rank_id付き）

use crate::cover::{CoverScore, FailureKind};
use biblink_common::{Record, Source};
use serde::Serialize;

/// 出所タグ付きのレコード参照
#[derive(Debug, Clone, Copy)]
pub struct TaggedRecord<'a> {
    pub source: Source,
    pub record: &'a Record,
}

/// 候補ペア
#[derive(Debug, Clone, Copy)]
pub struct CandidatePair<'a> {
    /// 生成順（左インデックス × 右件数 + 右インデックス）
    pub index: usize,
    pub left: TaggedRecord<'a>,
    pub right: TaggedRecord<'a>,
}

/// ペア単位で計算できる類似度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilaritySignals {
    pub title_distance: f64,
    pub author_distance: f64,
    pub language_match: bool,
    /// 発行年の生値（正規化はゲート後にまとめて行う）
    pub years: (Option<i32>, Option<i32>),
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredPair<'a> {
    pub pair: CandidatePair<'a>,
    pub signals: SimilaritySignals,
}

#[derive(Debug, Clone, Copy)]
pub struct GatedPair<'a> {
    pub pair: CandidatePair<'a>,
    pub signals: SimilaritySignals,
    pub year_difference: f64,
    pub cover: CoverScore,
    pub combined_score: f64,
}

/// ゲート通過ペアの記録
///
/// 発行年の正規化とカバー比較の前に何が残ったかを確認するためのもの。
/// 生成順で保持する。
#[derive(Debug, Clone, PartialEq)]
pub struct GatedCandidate {
    pub left: Record,
    pub right: Record,
    pub distance_title: f64,
    pub distance_author: f64,
    pub language_match: bool,
}

impl GatedCandidate {
    pub fn from_scored(scored: &ScoredPair<'_>) -> Self {
        Self {
            left: scored.pair.left.record.clone(),
            right: scored.pair.right.record.clone(),
            distance_title: scored.signals.title_distance,
            distance_author: scored.signals.author_distance,
            language_match: scored.signals.language_match,
        }
    }
}

/// 出力行
///
/// フィールド名は出力CSVの列名と一致する。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRow {
    #[serde(rename = "ID")]
    pub rank_id: usize,
    #[serde(rename = "ltable_ID")]
    pub ltable_id: String,
    #[serde(rename = "rtable_ID")]
    pub rtable_id: String,
    pub ltable_title: String,
    pub rtable_title: String,
    pub ltable_author: Option<String>,
    pub rtable_author: Option<String>,
    pub ltable_first_published_year: Option<i32>,
    pub rtable_first_published_year: Option<i32>,
    pub ltable_language: Option<String>,
    pub rtable_language: Option<String>,
    pub ltable_cover_image: Option<String>,
    pub rtable_cover_image: Option<String>,
    pub ltable_publisher: Option<String>,
    pub rtable_publisher: Option<String>,
    pub distance_title: f64,
    pub distance_author: f64,
    pub difference_year: f64,
    pub language_match: bool,
    pub cover_mse: f64,
    /// カバー画像が両側とも取得できたか（監査用、CSVには出力しない）
    pub cover_comparable: bool,
    pub score: f64,
}

impl MatchRow {
    pub fn from_gated(rank_id: usize, gated: &GatedPair<'_>) -> Self {
        let left = gated.pair.left.record;
        let right = gated.pair.right.record;

        Self {
            rank_id,
            ltable_id: left.id.clone(),
            rtable_id: right.id.clone(),
            ltable_title: left.title.clone(),
            rtable_title: right.title.clone(),
            ltable_author: left.author.clone(),
            rtable_author: right.author.clone(),
            ltable_first_published_year: left.published_year,
            rtable_first_published_year: right.published_year,
            ltable_language: left.language.clone(),
            rtable_language: right.language.clone(),
            ltable_cover_image: left.cover_image_url.clone(),
            rtable_cover_image: right.cover_image_url.clone(),
            ltable_publisher: left.publisher.clone(),
            rtable_publisher: right.publisher.clone(),
            distance_title: gated.signals.title_distance,
            distance_author: gated.signals.author_distance,
            difference_year: gated.year_difference,
            language_match: gated.signals.language_match,
            cover_mse: gated.cover.mse,
            cover_comparable: gated.cover.comparable,
            score: gated.combined_score,
        }
    }
}

/// 実行サマリー（データ品質の監査用）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSummary {
    pub left_records: usize,
    pub right_records: usize,
    /// 生成した候補ペア数（左 × 右）
    pub total_candidates: usize,
    pub gated_in: usize,
    pub rejected: usize,
    /// 不通過理由別の件数（重複あり）
    pub rejected_title: usize,
    pub rejected_author: usize,
    pub rejected_language: usize,
    /// ゲート通過ペアの発行年範囲
    pub year_range: Option<(i32, i32)>,
    /// どちらかの発行年が欠損している通過ペア数
    pub missing_year_pairs: usize,
    pub cover_compared: usize,
    pub cover_fallback_missing: usize,
    pub cover_fallback_transient: usize,
    pub cover_fallback_permanent: usize,
    /// 取得に失敗したURL数（URL単位、ペア単位ではない）
    pub failed_cover_urls_transient: usize,
    pub failed_cover_urls_permanent: usize,
    /// 実際のネットワーク取得回数
    pub image_fetches: usize,
}

impl MatchSummary {
    pub fn record_cover(&mut self, cover: &CoverScore) {
        match cover.fallback {
            None if cover.comparable => self.cover_compared += 1,
            None => {}
            Some(FailureKind::Missing) => self.cover_fallback_missing += 1,
            Some(FailureKind::Transient) => self.cover_fallback_transient += 1,
            Some(FailureKind::Permanent) => self.cover_fallback_permanent += 1,
        }
    }

    /// フォールバック値を使ったペアの合計
    pub fn cover_fallbacks(&self) -> usize {
        self.cover_fallback_missing + self.cover_fallback_transient + self.cover_fallback_permanent
    }
}

/// 照合結果（スコア昇順）
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub rows: Vec<MatchRow>,
    /// ゲート通過直後のペア（生成順）
    pub gated: Vec<GatedCandidate>,
    pub summary: MatchSummary,
}

impl MatchResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
