pub mod csv;
pub mod json;

use crate::error::Result;
use crate::matcher::MatchResult;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Unknown format: {}. Use csv or json", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// 出力先がディレクトリ（または拡張子なし）なら `<dir>/<name>.<ext>` にする
fn output_path_for_format(output: &Path, name: &str, format: ExportFormat) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", name, format.extension()))
    } else {
        output.to_path_buf()
    }
}

/// 照合結果を出力し、書き込んだパスを返す
pub fn export_results(
    result: &MatchResult,
    format: ExportFormat,
    output: &Path,
    name: &str,
) -> Result<PathBuf> {
    let output_path = output_path_for_format(output, name, format);
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    match format {
        ExportFormat::Csv => csv::generate_csv(&result.rows, &output_path)?,
        ExportFormat::Json => json::generate_json(&result.rows, &output_path)?,
    }

    Ok(output_path)
}
