//! ランキング
//!
//! 合成スコアの昇順に安定ソートし（同点は生成順）、rank_id を 0 から振る。

use super::types::{GatedPair, MatchRow};

pub fn rank(mut pairs: Vec<GatedPair<'_>>) -> Vec<MatchRow> {
    // sort_by は安定ソート
    pairs.sort_by(|a, b| {
        a.combined_score
            .total_cmp(&b.combined_score)
            .then(a.pair.index.cmp(&b.pair.index))
    });

    pairs
        .iter()
        .enumerate()
        .map(|(rank_id, pair)| MatchRow::from_gated(rank_id, pair))
        .collect()
}
