//! sampler のコマンドライン引数

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Scraper Sampler - エンドポイントの到達性/レイテンシ計測サービス
#[derive(Parser, Debug, Clone)]
#[command(name = "sampler")]
#[command(version, about, long_about = None)]
pub struct SamplerArgs {
    /// Listen port
    #[arg(short, long, default_value = "8092", env = "SAMPLER_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "SAMPLER_HOST")]
    pub host: String,

    /// File with one address per line
    #[arg(short, long, default_value = "sites.txt", env = "SAMPLER_SITES")]
    pub file: PathBuf,

    /// Full probe cycle period in seconds
    #[arg(long, default_value = "300", env = "SAMPLER_PERIOD")]
    pub period: u64,

    /// Per-probe connect timeout in seconds
    #[arg(long, default_value = "60", env = "SAMPLER_TIMEOUT")]
    pub timeout: u64,

    /// API key required in the `api-key` header (empty disables the check)
    #[arg(short, long, env = "SAMPLER_API_KEY")]
    pub key: Option<String>,
}

impl SamplerArgs {
    /// 待ち受けアドレス
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 全件ループの周期
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period)
    }

    /// 1回の計測のタイムアウト
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
