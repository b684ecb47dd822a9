//! Scraper Common
//!
//! sampler / tracker / monitor の各サービスで共有する型とランタイム部品

#![warn(missing_docs)]

/// APIキー認証ミドルウェア
pub mod auth;

/// エラー型定義
pub mod error;

/// 最速/最遅エンドポイントの追跡
pub mod extrema;

/// ロギング初期化ユーティリティ
pub mod logging;

/// サービス間の通信メッセージ
pub mod protocol;

/// 周期実行タスクランナー
pub mod runner;

/// axumサーバー起動・シャットダウンハンドリング
pub mod server;

/// 協調シャットダウン
pub mod shutdown;

/// 読み書きロックで保護されたコンテナ
pub mod sync;

/// 計測データ型
pub mod types;
