//! 書誌レコードの型定義
//!
//! - Record: 片方のカタログから読み込んだ1冊分の書誌情報
//! - Source: レコードがどちらのカタログ由来かを示すタグ

use serde::{Deserialize, Serialize};

/// レコードの出所（左テーブル / 右テーブル）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Left,
    Right,
}

impl Source {
    /// 出力列名の接頭辞
    pub fn column_prefix(&self) -> &'static str {
        match self {
            Source::Left => "ltable",
            Source::Right => "rtable",
        }
    }
}

/// 書誌レコード
///
/// 読み込み後は不変。欠損値は `None`（タイトルのみ空文字列で表現）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    /// ソース内の識別子
    pub id: String,
    /// タイトル（空の場合あり）
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    /// 初版発行年
    pub published_year: Option<i32>,
    pub language: Option<String>,
    pub cover_image_url: Option<String>,
}

impl Record {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.published_year = Some(year);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_cover(mut self, url: impl Into<String>) -> Self {
        self.cover_image_url = Some(url.into());
        self
    }
}
