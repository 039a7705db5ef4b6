//! カバー画像の取得
//!
//! - URLの正規化（プロトコル相対URLの補完、相対パスの拒否）
//! - `ImageFetcher` トレイトとreqwestによるHTTP実装
//! - 失敗理由の型付け（一時的 / 恒久的 / URLなし）

use crate::config::Config;
use crate::error::{BiblinkError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

/// 画像取得の失敗理由
///
/// バッチを中断しない。キャッシュに保存され、同じURLを参照する全ペアで共有される。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("カバー画像URLがありません")]
    MissingUrl,

    #[error("不正なURL: {0}")]
    InvalidUrl(String),

    #[error("HTTPステータス {status}: {url}")]
    Status { url: String, status: u16 },

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("ネットワークエラー: {0}")]
    Network(String),

    #[error("画像デコード失敗: {0}")]
    Decode(String),
}

/// 失敗の分類（集計用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// URLが未登録
    Missing,
    /// タイムアウト・通信エラー・5xx
    Transient,
    /// 4xx・不正URL・デコード不可
    Permanent,
}

impl FetchFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchFailure::MissingUrl => FailureKind::Missing,
            FetchFailure::Timeout(_) | FetchFailure::Network(_) => FailureKind::Transient,
            FetchFailure::Status { status, .. } if *status >= 500 => FailureKind::Transient,
            FetchFailure::Status { .. } | FetchFailure::InvalidUrl(_) | FetchFailure::Decode(_) => {
                FailureKind::Permanent
            }
        }
    }
}

/// カバー画像URLを取得可能な絶対URLに正規化
///
/// - `//covers.example.org/a.jpg` → `http://covers.example.org/a.jpg`
/// - `http://` / `https://` はそのまま
/// - `/images/a.jpg` のようなサイト相対パスや他スキームは不正
pub fn normalize_url(raw: &str) -> std::result::Result<String, FetchFailure> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchFailure::MissingUrl);
    }

    let candidate = if trimmed.starts_with("//") {
        format!("http:{}", trimmed)
    } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        return Err(FetchFailure::InvalidUrl(trimmed.to_string()));
    };

    Url::parse(&candidate)
        .map(|url| url.to_string())
        .map_err(|e| FetchFailure::InvalidUrl(format!("{} ({})", trimmed, e)))
}

/// 画像バイト列の取得元
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// 正規化済みURLからバイト列を取得する
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchFailure>;
}

/// HTTP経由の取得
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| BiblinkError::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchFailure::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        Ok(bytes.to_vec())
    }
}

fn classify_reqwest_error(url: &str, error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout(url.to_string())
    } else {
        FetchFailure::Network(format!("{}: {}", url, error))
    }
}
