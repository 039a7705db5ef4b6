//! タイトルの正規化
//!
//! - 小文字化
//! - 連続空白の統一
//! - 先頭の英語冠詞（the / a / an）の除去

use regex::Regex;

/// タイトルを比較用の正規化形式に変換
///
/// 冠詞のみのタイトル（"The" など）はそのまま残す。
pub fn normalize_title(title: &str) -> String {
    lazy_static::lazy_static! {
        static ref LEADING_ARTICLE_RE: Regex = Regex::new(r"^(?:the|a|an)\s+").unwrap();
    }

    let collapsed = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    LEADING_ARTICLE_RE.replace(&collapsed, "").into_owned()
}
