//! カバー画像キャッシュモジュール
//!
//! URLをキーにして取得・デコード結果（または失敗理由）を保持し、
//! 同じURLの再取得をスキップする。
//!
//! 各URLのスロットは `tokio::sync::OnceCell` で、同時に同じURLを要求した
//! タスクは1回の取得処理とその結果を共有する（single-flight）。
//! 実行中のみ有効で、永続化はしない。

use super::fetch::{FailureKind, FetchFailure};
use image::RgbImage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// 解決結果: 正規化済み画像、または失敗理由
pub type Resolution = std::result::Result<Arc<RgbImage>, FetchFailure>;

/// URL → 解決結果のスロット
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<Resolution>>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLのスロットを取得（なければ空のスロットを作成）
    ///
    /// ロックはスロットの取得・作成の間だけ保持する。取得処理の待機はスロット側で行う。
    pub fn slot(&self, key: &str) -> Arc<OnceCell<Resolution>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// 解決済みの結果をルックアップ
    pub fn get(&self, key: &str) -> Option<Resolution> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).and_then(|cell| cell.get().cloned())
    }

    /// キャッシュ件数（取得中のスロットを含む）
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 失敗したURLの件数を分類別に集計
    pub fn failure_counts(&self) -> HashMap<FailureKind, usize> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut counts = HashMap::new();

        for cell in entries.values() {
            if let Some(Err(failure)) = cell.get() {
                *counts.entry(failure.kind()).or_insert(0) += 1;
            }
        }

        counts
    }
}
