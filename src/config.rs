use crate::error::{BiblinkError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// カバー画像が比較できなかったペアの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverFailurePolicy {
    /// カバー項を0として加算（ペナルティなし）
    #[default]
    Zero,
    /// カバー項を除外し、残りの重みで再正規化
    Renormalize,
}

impl std::str::FromStr for CoverFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zero" => Ok(CoverFailurePolicy::Zero),
            "renormalize" | "renorm" => Ok(CoverFailurePolicy::Renormalize),
            _ => Err(format!("Unknown policy: {}. Use zero or renormalize", s)),
        }
    }
}

impl std::fmt::Display for CoverFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverFailurePolicy::Zero => write!(f, "zero"),
            CoverFailurePolicy::Renormalize => write!(f, "renormalize"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// タイトル距離の上限（未満で通過）
    pub title_threshold: f64,
    /// 著者距離の上限（未満で通過）
    pub author_threshold: f64,
    pub weight_title: f64,
    pub weight_author: f64,
    pub weight_year: f64,
    pub weight_cover: f64,
    /// 比較前に揃える画像サイズ (幅, 高さ)
    pub cover_canonical_size: (u32, u32),
    /// 同時に実行する画像取得の上限
    pub image_fetch_concurrency: usize,
    pub image_fetch_timeout_secs: u64,
    /// リクエスト間の最小間隔
    pub image_min_request_interval_ms: u64,
    /// タイトルの冠詞除去・小文字化を行う
    pub normalize_titles: bool,
    pub cover_failure_policy: CoverFailurePolicy,
    /// カバー画像比較を行わない
    pub skip_covers: bool,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| BiblinkError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("biblink").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            title_threshold: 0.6,
            author_threshold: 0.35,
            weight_title: 0.5,
            weight_author: 0.3,
            weight_year: 0.1,
            weight_cover: 0.1,
            cover_canonical_size: (300, 200),
            image_fetch_concurrency: 8,
            image_fetch_timeout_secs: 15,
            image_min_request_interval_ms: 100,
            normalize_titles: false,
            cover_failure_policy: CoverFailurePolicy::Zero,
            skip_covers: false,
            user_agent: format!("biblink/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// 設定値の整合性チェック
    ///
    /// 重みの合計が1であることで、合成スコアが [0, 1] に収まる。
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("title_threshold", self.title_threshold),
            ("author_threshold", self.author_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(BiblinkError::Config(format!(
                    "{} は 0 より大きく 1 以下である必要があります: {}",
                    name, value
                )));
            }
        }

        let weights = [
            ("weight_title", self.weight_title),
            ("weight_author", self.weight_author),
            ("weight_year", self.weight_year),
            ("weight_cover", self.weight_cover),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(BiblinkError::Config(format!(
                    "{} は 0 以上である必要があります: {}",
                    name, value
                )));
            }
        }

        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(BiblinkError::Config(format!(
                "重みの合計は 1.0 である必要があります: {}",
                total
            )));
        }

        let (width, height) = self.cover_canonical_size;
        if width == 0 || height == 0 {
            return Err(BiblinkError::Config(format!(
                "cover_canonical_size が不正です: {}x{}",
                width, height
            )));
        }

        if self.image_fetch_concurrency == 0 {
            return Err(BiblinkError::Config(
                "image_fetch_concurrency は 1 以上である必要があります".into(),
            ));
        }

        if self.image_fetch_timeout_secs == 0 {
            return Err(BiblinkError::Config(
                "image_fetch_timeout_secs は 1 以上である必要があります".into(),
            ));
        }

        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.image_fetch_timeout_secs)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.image_min_request_interval_ms)
    }
}
