//! 候補ペア生成
//!
//! 左 N 件 × 右 M 件の直積をそのまま生成する（絞り込みなし）。
//! 時間・メモリとも O(N·M) で、入力が数千件程度に収まることが前提。
//! これを超える規模はブロッキングが必要になるが、現状は対象外。

use super::types::{CandidatePair, TaggedRecord};
use biblink_common::{Record, Source};
use rayon::prelude::*;

/// 直積を生成（左優先順）
pub fn generate_candidates<'a>(left: &'a [Record], right: &'a [Record]) -> Vec<CandidatePair<'a>> {
    let right_len = right.len();
    let total = left.len() * right_len;

    (0..total)
        .into_par_iter()
        .map(|index| CandidatePair {
            index,
            left: TaggedRecord {
                source: Source::Left,
                record: &left[index / right_len],
            },
            right: TaggedRecord {
                source: Source::Right,
                record: &right[index % right_len],
            },
        })
        .collect()
}
