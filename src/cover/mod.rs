//! カバー画像比較モジュール
//!
//! 両側のカバー画像を解決し、正規化済み画像のRGB平均二乗誤差を [0, 1] で返す。
//! どちらかが解決できない場合は 0（ペナルティなし）とし、`comparable = false` を記録する。

pub mod cache;
pub mod fetch;
pub mod resolver;

pub use cache::{ImageCache, Resolution};
pub use fetch::{normalize_url, FailureKind, FetchFailure, HttpFetcher, ImageFetcher};
pub use resolver::ImageResolver;

use crate::error::{BiblinkError, Result};
use image::RgbImage;
use indicatif::ProgressBar;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;

/// カバー画像の比較結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverScore {
    /// 平均二乗誤差（0 = 同一）。比較不能時は 0
    pub mse: f64,
    /// 両側の画像が解決できたか
    pub comparable: bool,
    /// 比較不能だった場合の理由の分類
    pub fallback: Option<FailureKind>,
}

impl CoverScore {
    pub fn compared(mse: f64) -> Self {
        Self {
            mse,
            comparable: true,
            fallback: None,
        }
    }

    pub fn unavailable(kind: Option<FailureKind>) -> Self {
        Self {
            mse: 0.0,
            comparable: false,
            fallback: kind,
        }
    }
}

/// RGB各チャネルの平均二乗誤差を 255² で割って [0, 1] に収める
///
/// 画像は同じ正規化サイズであること。サイズが異なる場合は重なる部分のみ比較する。
pub fn mean_squared_error(a: &RgbImage, b: &RgbImage) -> f64 {
    let (a_raw, b_raw) = (a.as_raw(), b.as_raw());
    let samples = a_raw.len().min(b_raw.len());
    if samples == 0 {
        return 0.0;
    }

    let sum: u64 = a_raw
        .iter()
        .zip(b_raw.iter())
        .map(|(&x, &y)| {
            let diff = x as i64 - y as i64;
            (diff * diff) as u64
        })
        .sum();

    sum as f64 / (samples as f64 * 255.0 * 255.0)
}

/// 両側の解決結果からスコアを計算
pub fn compare_resolutions(left: &Resolution, right: &Resolution) -> CoverScore {
    match (left, right) {
        (Ok(a), Ok(b)) => CoverScore::compared(mean_squared_error(a, b)),
        (Err(failure), _) | (_, Err(failure)) => CoverScore::unavailable(Some(failure.kind())),
    }
}

/// 1ペア分のカバー類似度
pub async fn cover_similarity(
    resolver: &ImageResolver,
    left_url: Option<&str>,
    right_url: Option<&str>,
) -> CoverScore {
    let left = resolver.resolve_optional(left_url).await;
    let right = resolver.resolve_optional(right_url).await;
    compare_resolutions(&left, &right)
}

/// 複数ペアのカバー類似度をまとめて計算
///
/// 重複を除いたURLを並列に解決してから（同時取得数はリゾルバが制限）、
/// 各ペアをキャッシュ上の画像で比較する。戻り値は `pairs` と同じ順序。
pub async fn score_covers(
    resolver: Arc<ImageResolver>,
    pairs: &[(Option<String>, Option<String>)],
    progress: Option<ProgressBar>,
) -> Result<Vec<CoverScore>> {
    let urls: BTreeSet<&str> = pairs
        .iter()
        .flat_map(|(left, right)| [left.as_deref(), right.as_deref()])
        .flatten()
        .collect();

    if let Some(pb) = &progress {
        pb.set_length(urls.len() as u64);
    }

    let mut tasks = JoinSet::new();
    for url in urls {
        let resolver = Arc::clone(&resolver);
        let url = url.to_string();
        tasks.spawn(async move {
            let _ = resolver.resolve(&url).await;
        });
    }

    while let Some(joined) = tasks.join_next().await {
        joined.map_err(|e| BiblinkError::Task(e.to_string()))?;
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let mut scores = Vec::with_capacity(pairs.len());
    for (left, right) in pairs {
        scores.push(cover_similarity(&resolver, left.as_deref(), right.as_deref()).await);
    }

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_mse_identical() {
        let a = RgbImage::from_pixel(4, 4, Rgb([12, 200, 77]));
        assert_eq!(mean_squared_error(&a, &a.clone()), 0.0);
    }

    #[test]
    fn test_mse_black_white_is_one() {
        let black = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let white = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        assert!((mean_squared_error(&black, &white) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mse_single_channel() {
        let black = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let red = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        assert!((mean_squared_error(&black, &red) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_compare_resolutions_failure_defaults_to_zero() {
        let image: Resolution = Ok(Arc::new(RgbImage::new(2, 2)));
        let missing: Resolution = Err(FetchFailure::MissingUrl);

        let score = compare_resolutions(&image, &missing);
        assert_eq!(score.mse, 0.0);
        assert!(!score.comparable);
        assert_eq!(score.fallback, Some(FailureKind::Missing));
    }

    #[test]
    fn test_compare_resolutions_left_failure_wins() {
        let timeout: Resolution = Err(FetchFailure::Timeout("a".into()));
        let decode: Resolution = Err(FetchFailure::Decode("b".into()));

        let score = compare_resolutions(&timeout, &decode);
        assert_eq!(score.fallback, Some(FailureKind::Transient));
    }
}
