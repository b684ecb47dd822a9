//! ロギング初期化
//!
//! `RUST_LOG`（未設定なら `info`）でフィルタした標準出力ログを有効化する。
//! `SCRAPER_LOG_DIR` が設定されていれば、日次ローテーションのファイル出力も追加する。

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::{ScraperError, ScraperResult};

/// ログ出力先ディレクトリを指定する環境変数
pub const LOG_DIR_ENV: &str = "SCRAPER_LOG_DIR";

const DEFAULT_FILTER: &str = "info";

/// グローバルサブスクライバーを初期化する
///
/// ファイル出力が有効な場合は `WorkerGuard` を返す。プロセス終了まで保持すること。
pub fn init(service_name: &str) -> ScraperResult<Option<WorkerGuard>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let stdout_layer = fmt::layer().with_target(true).with_filter(filter());

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(&dir, format!("{service_name}.log"));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ScraperError::Config(format!("failed to initialize logging: {e}")))?;

    Ok(guard)
}
