//! tracker のコマンドライン引数

use clap::Parser;

/// Scraper Tracker - ユーザー別リクエスト数の集計サービス
#[derive(Parser, Debug, Clone)]
#[command(name = "tracker")]
#[command(version, about, long_about = None)]
pub struct TrackerArgs {
    /// Listen port
    #[arg(short, long, default_value = "8091", env = "TRACKER_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "TRACKER_HOST")]
    pub host: String,

    /// SQLite database URL
    #[arg(short, long, default_value = "sqlite://tracker.db", env = "TRACKER_DATABASE_URL")]
    pub database_url: String,

    /// API key required in the `api-key` header (empty disables the check)
    #[arg(short, long, env = "TRACKER_API_KEY")]
    pub key: Option<String>,
}

impl TrackerArgs {
    /// 待ち受けアドレス
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
