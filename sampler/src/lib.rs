//! Scraper Sampler
//!
//! エンドポイントの到達性とレイテンシを周期的に計測するサービス

#![warn(missing_docs)]

/// REST APIハンドラー
pub mod api;

/// コマンドライン引数
pub mod cli;

/// バッチ化されたプローブスケジューラ
pub mod probe;

/// 監視対象アドレス一覧の読み込み
pub mod sites;

pub use probe::ProbeManager;
