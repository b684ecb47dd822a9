//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! プローブ失敗や集計送信失敗のような「想定内」の障害はここに現れない。
//! それらは各サブシステム内でログに記録され、データの劣化（unavailable化、
//! フラッシュのスキップ）として扱われる。

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Scraper共通エラー
#[derive(Debug, Error)]
pub enum ScraperError {
    /// 設定エラー（起動時に致命的）
    #[error("Configuration error: {0}")]
    Config(String),

    /// ファイルI/Oエラー
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// データベースエラー
    #[error("Database error: {0}")]
    Database(String),

    /// HTTPクライアントエラー
    #[error("HTTP client error: {0}")]
    Http(String),

    /// 呼び出し側の入力が不正
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// シリアライズエラー
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScraperError {
    /// 外部クライアント向けの安全なエラーメッセージ
    ///
    /// アドレスやSQLなどの内部情報は含めない。詳細は`Display`でログにのみ出力する。
    pub fn external_message(&self) -> &'static str {
        match self {
            Self::Config(_) => "Service misconfigured",
            Self::Io(_) => "Internal server error",
            Self::Database(_) => "Database error",
            Self::Http(_) => "Backend service unavailable",
            Self::InvalidInput(_) => "Invalid request",
            Self::Serialization(_) => "Invalid request body",
        }
    }
}

/// Scraper共通Result型
pub type ScraperResult<T> = Result<T, ScraperError>;

/// Axum用のエラーレスポンス型
#[derive(Debug)]
pub struct AppError(pub ScraperError);

impl From<ScraperError> for AppError {
    fn from(err: ScraperError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            ScraperError::InvalidInput(_) | ScraperError::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            ScraperError::Http(_) => StatusCode::BAD_GATEWAY,
            ScraperError::Config(_) | ScraperError::Io(_) | ScraperError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // 詳細はログにのみ残す
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Rejected request");
        }

        let payload = json!({
            "error": self.0.external_message()
        });

        (status, Json(payload)).into_response()
    }
}
