//! 照合前の正規化モジュール
//!
//! 表記揺れによる距離の水増しを抑える。既定では無効
//! （`Config::normalize_titles`）。

pub mod title;

pub use title::normalize_title;
