//! クリーニング済みテーブルの読み込み
//!
//! 列: `ID, title, author, publisher, first_published_year, language, cover_image`
//! （列順は任意。`subtitle, pages, rating, isbn_10, isbn_13` などの追加列は無視）

use crate::error::{BiblinkError, Result};
use biblink_common::{clean_field, parse_year, Record};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// 列名 → 列インデックス
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    id: usize,
    title: usize,
    author: Option<usize>,
    publisher: Option<usize>,
    year: Option<usize>,
    language: Option<usize>,
    cover: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| BiblinkError::InvalidInput(format!("必須列がありません: {}", name)))
        };

        Ok(Self {
            id: required("ID")?,
            title: required("title")?,
            author: find("author"),
            publisher: find("publisher"),
            year: find("first_published_year"),
            language: find("language"),
            cover: find("cover_image"),
        })
    }

    fn record(&self, row: &StringRecord) -> Record {
        let cell = |index: Option<usize>| index.and_then(|i| row.get(i)).and_then(clean_field);

        Record {
            id: cell(Some(self.id)).unwrap_or_default(),
            title: cell(Some(self.title)).unwrap_or_default(),
            author: cell(self.author),
            publisher: cell(self.publisher),
            published_year: self.year.and_then(|i| row.get(i)).and_then(parse_year),
            language: cell(self.language),
            cover_image_url: cell(self.cover),
        }
    }
}

/// CSVファイルからレコードを読み込み
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    if !path.exists() {
        return Err(BiblinkError::FileNotFound(path.display().to_string()));
    }

    let file = std::fs::File::open(path)?;
    let records = read_records(file)?;
    debug!(path = %path.display(), records = records.len(), "Loaded records");
    Ok(records)
}

/// 任意のリーダーからレコードを読み込み
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut records = Vec::new();
    for row in reader.records() {
        records.push(columns.record(&row?));
    }

    Ok(records)
}
