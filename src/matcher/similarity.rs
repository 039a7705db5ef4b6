//! 類似度計算
//!
//! ペアごとに独立に計算できる信号:
//! - タイトル距離（正規化編集距離）
//! - 著者距離（どちらかが欠損なら 1）
//! - 言語一致（どちらかが欠損なら一致扱い）
//! - 発行年（生値のみ。正規化はゲート後）

use super::types::{CandidatePair, ScoredPair, SimilaritySignals};
use crate::normalizer::normalize_title;
use rayon::prelude::*;
use std::borrow::Cow;

/// 類似度エンジン
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityEngine {
    normalize_titles: bool,
}

impl SimilarityEngine {
    pub fn new(normalize_titles: bool) -> Self {
        Self { normalize_titles }
    }

    /// 1ペアの類似度
    pub fn score(&self, pair: &CandidatePair<'_>) -> SimilaritySignals {
        let left = pair.left.record;
        let right = pair.right.record;

        SimilaritySignals {
            title_distance: self.title_distance(&left.title, &right.title),
            author_distance: author_distance(left.author.as_deref(), right.author.as_deref()),
            language_match: language_match(left.language.as_deref(), right.language.as_deref()),
            years: (left.published_year, right.published_year),
        }
    }

    /// 全ペアを並列に計算（生成順を保持）
    pub fn score_all<'a>(&self, pairs: Vec<CandidatePair<'a>>) -> Vec<ScoredPair<'a>> {
        pairs
            .into_par_iter()
            .map(|pair| ScoredPair {
                signals: self.score(&pair),
                pair,
            })
            .collect()
    }

    pub fn title_distance(&self, left: &str, right: &str) -> f64 {
        let (left, right): (Cow<str>, Cow<str>) = if self.normalize_titles {
            (normalize_title(left).into(), normalize_title(right).into())
        } else {
            (left.into(), right.into())
        };
        normalized_edit_distance(&left, &right)
    }
}

/// 空白のみの値は欠損として扱う
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// 著者距離
///
/// 欠損（空文字列を含む）は中立ではなく強い不一致として扱う（別著者の作品の通過を防ぐ）。
pub fn author_distance(left: Option<&str>, right: Option<&str>) -> f64 {
    match (present(left), present(right)) {
        (Some(l), Some(r)) => normalized_edit_distance(l, r),
        _ => 1.0,
    }
}

/// 言語一致
///
/// 不明な言語（空文字列を含む）は互換として扱う。両側にあって異なる場合のみ不一致。
/// 前後の空白は無視する。
pub fn language_match(left: Option<&str>, right: Option<&str>) -> bool {
    match (present(left), present(right)) {
        (Some(l), Some(r)) => l == r,
        _ => true,
    }
}

/// 正規化編集距離 = 編集距離 / 長い方の文字数
///
/// 両方空なら 0、片方だけ空なら 1。
pub fn normalized_edit_distance(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }

    levenshtein_distance(a, b) as f64 / max_len as f64
}

/// レーベンシュタイン距離を計算（文字単位）
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // 直前の行だけ保持する
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = if a_char == b_char { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn test_levenshtein_counts_chars_not_bytes() {
        assert_eq!(levenshtein_distance("Müller", "Muller"), 1);
        assert_eq!(levenshtein_distance("舗装工", "舗装補修工"), 2);
    }

    #[test]
    fn test_cat_bat() {
        let distance = normalized_edit_distance("cat", "bat");
        assert!((distance - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_title_edge_policy() {
        let engine = SimilarityEngine::default();
        assert_eq!(engine.title_distance("", ""), 0.0);
        assert_eq!(engine.title_distance("", "Dracula"), 1.0);
        assert_eq!(engine.title_distance("Dracula", ""), 1.0);
        assert_eq!(engine.title_distance("Dracula", "Dracula"), 0.0);
    }

    #[test]
    fn test_title_distance_with_normalization() {
        let plain = SimilarityEngine::new(false);
        let normalized = SimilarityEngine::new(true);

        assert!(plain.title_distance("The Hobbit", "hobbit") > 0.0);
        assert_eq!(normalized.title_distance("The Hobbit", "hobbit"), 0.0);
    }

    #[test]
    fn test_author_missing_is_maximal() {
        assert_eq!(author_distance(None, Some("Tolkien")), 1.0);
        assert_eq!(author_distance(Some("Tolkien"), None), 1.0);
        assert_eq!(author_distance(None, None), 1.0);
        assert_eq!(author_distance(Some("Tolkien"), Some("Tolkien")), 0.0);
    }

    #[test]
    fn test_blank_author_is_missing() {
        assert_eq!(author_distance(Some(""), Some("")), 1.0);
        assert_eq!(author_distance(Some("   "), Some("Tolkien")), 1.0);
        assert_eq!(author_distance(Some(" Tolkien "), Some("Tolkien")), 0.0);
    }

    #[test]
    fn test_blank_language_is_unknown() {
        assert!(language_match(Some(""), Some("English")));
        assert!(language_match(Some("English"), Some("  ")));
        assert!(language_match(Some(""), Some("")));
        assert!(language_match(Some("English "), Some("English")));
        assert!(!language_match(Some(" French"), Some("English")));
    }

    #[test]
    fn test_language_match_policy() {
        assert!(language_match(Some("English"), Some("English")));
        assert!(!language_match(Some("English"), Some("French")));
        assert!(language_match(None, Some("French")));
        assert!(language_match(Some("English"), None));
        assert!(language_match(None, None));
    }

    #[test]
    fn test_distances_bounded() {
        let samples = ["", "a", "ab", "Moby Dick", "moby-dick; or, the whale", "白鯨"];
        for a in samples {
            for b in samples {
                let d = normalized_edit_distance(a, b);
                assert!((0.0..=1.0).contains(&d), "{} vs {} -> {}", a, b, d);
            }
        }
    }
}
