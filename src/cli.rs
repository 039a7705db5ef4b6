use crate::config::CoverFailurePolicy;
use crate::export::ExportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "biblink")]
#[command(about = "2つの書誌カタログ間のレコード照合・候補ランキング", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 設定ファイル（デフォルト: ~/.config/biblink/config.json）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 2つのテーブルを照合して候補ペアを出力
    Match {
        /// 左テーブル（CSV）
        #[arg(required = true)]
        left: PathBuf,

        /// 右テーブル（CSV）
        #[arg(required = true)]
        right: PathBuf,

        /// 出力ファイル/ディレクトリ（デフォルト: カレント/tableC.csv）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力形式 (csv/json)
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// カバー画像比較を行わない
        #[arg(long)]
        no_covers: bool,

        /// 画像取得の同時実行数
        #[arg(long)]
        concurrency: Option<usize>,

        /// 画像取得のタイムアウト（秒）
        #[arg(long)]
        timeout: Option<u64>,

        /// タイトルの冠詞除去・小文字化を有効化
        #[arg(long)]
        normalize_titles: bool,

        /// カバー比較不能時の扱い (zero/renormalize)
        #[arg(long)]
        cover_policy: Option<CoverFailurePolicy>,

        /// ゲート通過直後のペアをCSVに書き出す（発行年差・カバー比較の前）
        #[arg(long, value_name = "PATH")]
        dump_gated: Option<PathBuf>,
    },

    /// 設定を表示/初期化
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// デフォルト設定をファイルに書き出す
        #[arg(long)]
        init: bool,
    },
}
