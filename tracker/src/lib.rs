//! Scraper Tracker
//!
//! monitor から送られるユーザー別リクエスト数を蓄積し、期間集計を返すサービス

#![warn(missing_docs)]

/// REST APIハンドラー
pub mod api;

/// コマンドライン引数
pub mod cli;

/// データベースアクセス
pub mod db;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// リクエスト数ストレージ
    pub storage: db::requests::RequestCountStorage,
}
