//! CSV/JSON出力の統合テスト
//!
//! 列順・欠損値の空フィールド化・ファイル出力を検証

use biblink::export::csv::{generate_gated_csv, output_columns, write_csv, write_gated_csv};
use biblink::export::{export_results, ExportFormat};
use biblink::matcher::{GatedCandidate, MatchResult, MatchRow, MatchSummary};
use biblink_common::Record;
use tempfile::tempdir;

fn create_test_row(rank_id: usize) -> MatchRow {
    MatchRow {
        rank_id,
        ltable_id: format!("OL{}W", rank_id),
        rtable_id: format!("{}", 1000 + rank_id),
        ltable_title: "The Adventures of Sherlock Holmes".to_string(),
        rtable_title: "Adventures of Sherlock Holmes, The".to_string(),
        ltable_author: Some("Arthur Conan Doyle".to_string()),
        rtable_author: Some("Doyle, Arthur Conan".to_string()),
        ltable_first_published_year: Some(1892),
        rtable_first_published_year: None,
        ltable_language: Some("English".to_string()),
        rtable_language: None,
        ltable_cover_image: Some("//covers.openlibrary.org/b/id/1-M.jpg".to_string()),
        rtable_cover_image: None,
        ltable_publisher: None,
        rtable_publisher: Some("George Newnes".to_string()),
        distance_title: 0.25,
        distance_author: 0.3,
        difference_year: 0.0,
        language_match: true,
        cover_mse: 0.0,
        cover_comparable: false,
        score: 0.215,
    }
}

fn test_result(count: usize) -> MatchResult {
    MatchResult {
        rows: (0..count).map(create_test_row).collect(),
        gated: Vec::new(),
        summary: MatchSummary {
            gated_in: count,
            ..Default::default()
        },
    }
}

fn read_back(bytes: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

#[test]
fn test_csv_header_order() {
    let mut buffer = Vec::new();
    write_csv(&[], &mut buffer).expect("CSV出力失敗");

    let (headers, rows) = read_back(&buffer);
    assert_eq!(headers, output_columns());
    assert_eq!(headers.len(), 21);
    assert!(rows.is_empty());
    assert_eq!(headers.first().map(String::as_str), Some("ID"));
    assert_eq!(headers.last().map(String::as_str), Some("score"));
}

#[test]
fn test_csv_missing_values_are_empty() {
    let mut buffer = Vec::new();
    write_csv(&[create_test_row(0)], &mut buffer).expect("CSV出力失敗");

    let text = String::from_utf8(buffer.clone()).unwrap();
    assert!(!text.contains("None"));
    assert!(!text.contains("null"));

    let (headers, rows) = read_back(&buffer);
    let row = &rows[0];
    let field = |name: &str| {
        let index = headers.iter().position(|h| h == name).unwrap();
        row[index].as_str()
    };

    assert_eq!(field("ID"), "0");
    assert_eq!(field("ltable_first_published_year"), "1892");
    assert_eq!(field("rtable_first_published_year"), "");
    assert_eq!(field("rtable_language"), "");
    assert_eq!(field("ltable_publisher"), "");
    assert_eq!(field("rtable_author"), "Doyle, Arthur Conan");
    assert_eq!(field("language_match"), "1");
    assert_eq!(field("score"), "0.215");
}

#[test]
fn test_csv_quotes_only_when_necessary() {
    let mut buffer = Vec::new();
    write_csv(&[create_test_row(3)], &mut buffer).expect("CSV出力失敗");

    let text = String::from_utf8(buffer).unwrap();
    assert!(text.contains("\"Doyle, Arthur Conan\""));
    assert!(text.contains(",The Adventures of Sherlock Holmes,"));
}

#[test]
fn test_export_csv_to_directory() {
    let dir = tempdir().expect("Failed to create temp dir");

    let written = export_results(&test_result(3), ExportFormat::Csv, dir.path(), "tableC")
        .expect("CSV出力失敗");

    assert_eq!(written, dir.path().join("tableC.csv"));
    let content = std::fs::read(&written).expect("ファイル読み込み失敗");
    let (_, rows) = read_back(&content);
    assert_eq!(rows.len(), 3);
}

#[test]
fn test_export_json_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("nested").join("matches.json");

    let written = export_results(&test_result(2), ExportFormat::Json, &output, "tableC")
        .expect("JSON出力失敗");
    assert_eq!(written, output);

    let content = std::fs::read_to_string(&written).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    let rows = value.as_array().expect("行の配列ではない");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["ID"], 0);
    assert_eq!(rows[0]["ltable_ID"], "OL0W");
    assert!(rows[0]["rtable_language"].is_null());
    assert_eq!(rows[0]["cover_comparable"], false);
    assert_eq!(rows[1]["ID"], 1);
}

fn create_gated_candidate() -> GatedCandidate {
    GatedCandidate {
        left: Record::new("OL27448W", "The Lord of the Rings")
            .with_author("J.R.R. Tolkien")
            .with_year(1954)
            .with_language("English"),
        right: Record::new("123", "Lord of the Rings, The")
            .with_author("Tolkien, J. R. R.")
            .with_publisher("Allen & Unwin"),
        distance_title: 0.5,
        distance_author: 0.25,
        language_match: true,
    }
}

/// ゲート通過ペアのCSV: 左右の列が交互に並び、発行年差・スコアは含まない
#[test]
fn test_gated_csv_columns_and_values() {
    let mut buffer = Vec::new();
    write_gated_csv(&[create_gated_candidate()], &mut buffer).expect("CSV出力失敗");

    let (headers, rows) = read_back(&buffer);
    assert_eq!(headers.len(), 17);
    assert_eq!(&headers[..4], &["ltable_ID", "rtable_ID", "ltable_title", "rtable_title"]);
    assert!(!headers.iter().any(|h| h == "score" || h == "difference_year"));

    let row = &rows[0];
    let field = |name: &str| {
        let index = headers.iter().position(|h| h == name).unwrap();
        row[index].as_str()
    };
    assert_eq!(field("ltable_ID"), "OL27448W");
    assert_eq!(field("rtable_ID"), "123");
    assert_eq!(field("rtable_author"), "Tolkien, J. R. R.");
    assert_eq!(field("ltable_first_published_year"), "1954");
    assert_eq!(field("rtable_first_published_year"), "");
    assert_eq!(field("rtable_language"), "");
    assert_eq!(field("ltable_publisher"), "");
    assert_eq!(field("rtable_publisher"), "Allen & Unwin");
    assert_eq!(field("distance_title"), "0.5");
    assert_eq!(field("distance_author"), "0.25");
    assert_eq!(field("language_match"), "1");
}

#[test]
fn test_gated_csv_file_creates_parent() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("audit").join("table_c_initial.csv");

    generate_gated_csv(&[create_gated_candidate(), create_gated_candidate()], &output)
        .expect("CSV出力失敗");

    let content = std::fs::read(&output).expect("ファイル読み込み失敗");
    let (_, rows) = read_back(&content);
    assert_eq!(rows.len(), 2);
}
