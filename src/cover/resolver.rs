//! カバー画像リゾルバ
//!
//! URL → 正規化済みRGB画像。取得・デコード・リサイズを1回だけ行い、
//! 結果をキャッシュで共有する。
//!
//! - 同時取得数はセマフォで制限
//! - リクエスト間に最小間隔を空ける（取得元サーバーへの配慮）
//! - 取得ごとにタイムアウト。タイムアウトとデコード失敗は同じ扱い

use super::cache::{ImageCache, Resolution};
use super::fetch::{normalize_url, FetchFailure, HttpFetcher, ImageFetcher};
use crate::config::Config;
use crate::error::Result;
use image::imageops::FilterType;
use image::RgbImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

pub struct ImageResolver {
    fetcher: Arc<dyn ImageFetcher>,
    cache: ImageCache,
    permits: Semaphore,
    canonical_size: (u32, u32),
    timeout: Duration,
    min_interval: Duration,
    /// 直前のリクエスト時刻
    last_request: Mutex<Option<Instant>>,
    fetch_count: AtomicUsize,
}

impl ImageResolver {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            cache: ImageCache::new(),
            permits: Semaphore::new(config.image_fetch_concurrency.max(1)),
            canonical_size: config.cover_canonical_size,
            timeout: config.fetch_timeout(),
            min_interval: config.min_request_interval(),
            last_request: Mutex::new(None),
            fetch_count: AtomicUsize::new(0),
        }
    }

    /// reqwestによるHTTP取得を使うリゾルバ
    pub fn http(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(config)?;
        Ok(Self::new(Arc::new(fetcher), config))
    }

    /// URLを解決
    ///
    /// 同じURLへの同時要求は1回の取得を共有する。失敗もキャッシュされ、
    /// ログは URL ごとに1回だけ出力される。
    pub async fn resolve(&self, raw_url: &str) -> Resolution {
        let normalized = normalize_url(raw_url);
        let key = match &normalized {
            Ok(url) => url.clone(),
            Err(_) => raw_url.trim().to_string(),
        };

        let slot = self.cache.slot(&key);
        let resolution = slot
            .get_or_init(|| async move {
                let resolution = match normalized {
                    Ok(url) => self.fetch_and_decode(&url).await,
                    Err(failure) => Err(failure),
                };

                match &resolution {
                    Ok(_) => debug!(url = %key, "Cover image resolved"),
                    Err(FetchFailure::MissingUrl) => {}
                    Err(failure) => warn!(
                        url = %key,
                        kind = ?failure.kind(),
                        "Cover image unavailable: {}",
                        failure
                    ),
                }

                resolution
            })
            .await;

        resolution.clone()
    }

    /// 任意のURL（未指定可）を解決
    pub async fn resolve_optional(&self, raw_url: Option<&str>) -> Resolution {
        match raw_url {
            Some(url) => self.resolve(url).await,
            None => Err(FetchFailure::MissingUrl),
        }
    }

    async fn fetch_and_decode(&self, url: &str) -> Resolution {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| FetchFailure::Network(format!("{}: {}", url, e)))?;

        self.enforce_rate_limit().await;
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        debug!(url = %url, "Fetching cover image");

        let bytes = tokio::time::timeout(self.timeout, self.fetcher.fetch(url))
            .await
            .map_err(|_| FetchFailure::Timeout(url.to_string()))??;

        let (width, height) = self.canonical_size;
        let image = tokio::task::spawn_blocking(move || decode_canonical(&bytes, width, height))
            .await
            .map_err(|e| FetchFailure::Decode(e.to_string()))??;

        Ok(Arc::new(image))
    }

    /// リクエスト間隔を強制
    async fn enforce_rate_limit(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let mut last_request = self.last_request.lock().await;

        if let Some(last_time) = *last_request {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let sleep_duration = self.min_interval - elapsed;
                debug!(
                    sleep_ms = sleep_duration.as_millis() as u64,
                    "Rate limiting: sleeping before cover request"
                );
                sleep(sleep_duration).await;
            }
        }

        *last_request = Some(Instant::now());
    }

    /// 実際に行ったネットワーク取得の回数
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }
}

/// バイト列をデコードし、比較用のサイズ・色空間（RGB8）に揃える
pub fn decode_canonical(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> std::result::Result<RgbImage, FetchFailure> {
    let decoded = image::load_from_memory(bytes).map_err(|e| FetchFailure::Decode(e.to_string()))?;
    Ok(decoded.resize_exact(width, height, FilterType::Triangle).to_rgb8())
}
