//! Scraper Monitor
//!
//! ユーザー向けの問い合わせ窓口。エンドポイント状態の参照と、
//! ユーザー別リクエスト数の集計・転送を行う。

#![warn(missing_docs)]

/// ユーザー別アクティビティの集計とフラッシュ
pub mod aggregator;

/// REST APIハンドラー
pub mod api;

/// コマンドライン引数
pub mod cli;

/// tracker クライアント
pub mod collector;

/// ユーザー別カウンタ
pub mod counter;

/// 問い合わせ/転送の窓口
pub mod facade;

/// サービス間HTTPクライアント
pub mod http;

/// リモート sampler のミラー
pub mod remote;

/// エンドポイント状態の取得元
pub mod source;

pub use facade::Monitor;
