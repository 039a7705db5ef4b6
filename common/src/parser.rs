//! 入力セルのパーサー
//!
//! クリーニング済みテーブルのセル値を欠損値込みで解釈する。
//! 空セル・空白のみのセルは欠損として扱う。

use regex::Regex;

/// セル値を整形（空なら `None`）
///
/// # Examples
/// ```
/// use biblink_common::clean_field;
///
/// assert_eq!(clean_field("  Penguin "), Some("Penguin".to_string()));
/// assert_eq!(clean_field("   "), None);
/// ```
pub fn clean_field(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// 発行年をパース
///
/// `1890` と、表計算ツールが書き出す `1890.0` の両方を受け付ける。
/// それ以外（`c. 1890`、`unknown` など）は欠損とする。
///
/// # Examples
/// ```
/// use biblink_common::parse_year;
///
/// assert_eq!(parse_year("1937"), Some(1937));
/// assert_eq!(parse_year("1937.0"), Some(1937));
/// assert_eq!(parse_year("n/a"), None);
/// ```
pub fn parse_year(raw: &str) -> Option<i32> {
    lazy_static::lazy_static! {
        static ref YEAR_RE: Regex = Regex::new(r"^(-?\d{1,5})(?:\.0+)?$").unwrap();
    }

    let trimmed = raw.trim();
    YEAR_RE
        .captures(trimmed)
        .and_then(|cap| cap[1].parse::<i32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_field() {
        assert_eq!(clean_field("Tolkien"), Some("Tolkien".to_string()));
        assert_eq!(clean_field(""), None);
        assert_eq!(clean_field("\t \n"), None);
    }

    #[test]
    fn test_parse_year_variants() {
        assert_eq!(parse_year("1890"), Some(1890));
        assert_eq!(parse_year(" 1890 "), Some(1890));
        assert_eq!(parse_year("1890.0"), Some(1890));
        assert_eq!(parse_year("-44"), Some(-44));
    }

    #[test]
    fn test_parse_year_rejects_non_numeric() {
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("c. 1890"), None);
        assert_eq!(parse_year("1890.5"), None);
        assert_eq!(parse_year("unknown"), None);
    }
}
