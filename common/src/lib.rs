//! biblink Common Library
//!
//! 照合エンジンと入出力層で共有される書誌レコード型とフィールドパーサー

pub mod types;
pub mod parser;

pub use types::{Record, Source};
pub use parser::{clean_field, parse_year};
