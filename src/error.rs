use thiserror::Error;

#[derive(Error, Debug)]
pub enum BiblinkError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("入力データが不正: {0}")]
    InvalidInput(String),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTPクライアント初期化エラー: {0}")]
    HttpClient(String),

    #[error("非同期タスクエラー: {0}")]
    Task(String),

    /// パイプラインの欠陥を示す。データ品質の問題ではないので処理を中断する
    #[error("不変条件違反: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, BiblinkError>;
