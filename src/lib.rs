//! biblink
//!
//! 2つのカタログから収集した書誌レコードを照合し、
//! 同一作品の候補ペアを信頼度順に並べる。
//!
//! ## 処理フロー
//! 1. 候補ペア生成（直積）
//! 2. 類似度計算（タイトル・著者・言語・発行年）
//! 3. 閾値ゲート
//! 4. 発行年差の正規化（ゲート通過ペア全体の最小/最大年）
//! 5. カバー画像比較
//! 6. 重み付きスコア・ランキング

pub mod cli;
pub mod config;
pub mod cover;
pub mod error;
pub mod export;
pub mod loader;
pub mod matcher;
pub mod normalizer;
