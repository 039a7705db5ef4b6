//! CSV出力
//!
//! 列順は固定。欠損値は空フィールドとして書き出す（"null" / "None" にはしない）。
//! クォートは必要な場合のみ。

use crate::error::Result;
use crate::matcher::{GatedCandidate, MatchRow};
use biblink_common::{Record, Source};
use std::io::Write;
use std::path::Path;

/// 左右それぞれに出力するレコード列（`ltable_<列>`, `rtable_<列>` の順）
pub static RECORD_COLUMNS: [&str; 7] = [
    "ID",
    "title",
    "author",
    "first_published_year",
    "language",
    "cover_image",
    "publisher",
];

const GATE_COLUMNS: [&str; 3] = ["distance_title", "distance_author", "language_match"];

const SCORE_COLUMNS: [&str; 3] = ["difference_year", "cover_mse", "score"];

/// 照合結果の列（21列）
pub fn output_columns() -> Vec<String> {
    let mut columns = vec!["ID".to_string()];
    columns.extend(paired_columns());
    columns.extend(GATE_COLUMNS[..2].iter().map(|c| c.to_string()));
    columns.push(SCORE_COLUMNS[0].to_string());
    columns.push(GATE_COLUMNS[2].to_string());
    columns.extend(SCORE_COLUMNS[1..].iter().map(|c| c.to_string()));
    columns
}

/// ゲート通過ペアの列（発行年差・カバー・スコアなし）
pub fn gated_columns() -> Vec<String> {
    let mut columns: Vec<String> = paired_columns().collect();
    columns.extend(GATE_COLUMNS.iter().map(|c| c.to_string()));
    columns
}

fn paired_columns() -> impl Iterator<Item = String> {
    RECORD_COLUMNS.iter().flat_map(|column| {
        [Source::Left, Source::Right].map(|source| format!("{}_{}", source.column_prefix(), column))
    })
}

pub fn generate_csv(rows: &[MatchRow], output_path: &Path) -> Result<()> {
    let file = std::fs::File::create(output_path)?;
    write_csv(rows, file)
}

pub fn write_csv<W: Write>(rows: &[MatchRow], writer: W) -> Result<()> {
    let mut writer = csv_writer(writer);

    writer.write_record(output_columns())?;
    for row in rows {
        writer.write_record(row_fields(row))?;
    }

    writer.flush()?;
    Ok(())
}

pub fn generate_gated_csv(gated: &[GatedCandidate], output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(output_path)?;
    write_gated_csv(gated, file)
}

pub fn write_gated_csv<W: Write>(gated: &[GatedCandidate], writer: W) -> Result<()> {
    let mut writer = csv_writer(writer);

    writer.write_record(gated_columns())?;
    for candidate in gated {
        let mut fields: Vec<String> = record_fields(&candidate.left)
            .into_iter()
            .zip(record_fields(&candidate.right))
            .flat_map(|(left, right)| [left, right])
            .collect();
        fields.push(candidate.distance_title.to_string());
        fields.push(candidate.distance_author.to_string());
        fields.push((candidate.language_match as u8).to_string());
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    Ok(())
}

fn csv_writer<W: Write>(writer: W) -> ::csv::Writer<W> {
    ::csv::WriterBuilder::new()
        .quote_style(::csv::QuoteStyle::Necessary)
        .from_writer(writer)
}

/// RECORD_COLUMNS と同じ順序
fn record_fields(record: &Record) -> [String; 7] {
    [
        record.id.clone(),
        record.title.clone(),
        optional(&record.author),
        optional(&record.published_year),
        optional(&record.language),
        optional(&record.cover_image_url),
        optional(&record.publisher),
    ]
}

fn row_fields(row: &MatchRow) -> [String; 21] {
    [
        row.rank_id.to_string(),
        row.ltable_id.clone(),
        row.rtable_id.clone(),
        row.ltable_title.clone(),
        row.rtable_title.clone(),
        optional(&row.ltable_author),
        optional(&row.rtable_author),
        optional(&row.ltable_first_published_year),
        optional(&row.rtable_first_published_year),
        optional(&row.ltable_language),
        optional(&row.rtable_language),
        optional(&row.ltable_cover_image),
        optional(&row.rtable_cover_image),
        optional(&row.ltable_publisher),
        optional(&row.rtable_publisher),
        row.distance_title.to_string(),
        row.distance_author.to_string(),
        row.difference_year.to_string(),
        (row.language_match as u8).to_string(),
        row.cover_mse.to_string(),
        row.score.to_string(),
    ]
}

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}
