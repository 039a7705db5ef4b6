//! JSON出力（行の配列）

use crate::error::Result;
use crate::matcher::MatchRow;
use std::io::BufWriter;
use std::path::Path;

pub fn generate_json(rows: &[MatchRow], output_path: &Path) -> Result<()> {
    let file = std::fs::File::create(output_path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, rows)?;
    Ok(())
}
