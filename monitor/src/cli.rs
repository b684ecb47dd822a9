//! monitor のコマンドライン引数

use clap::Parser;
use scraper_common::error::{ScraperError, ScraperResult};
use std::path::PathBuf;
use std::time::Duration;

/// Scraper Monitor - エンドポイント状態とユーザー別アクティビティの問い合わせ窓口
#[derive(Parser, Debug, Clone)]
#[command(name = "monitor")]
#[command(version, about, long_about = None)]
pub struct MonitorArgs {
    /// Listen port
    #[arg(short, long, default_value = "8090", env = "MONITOR_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "MONITOR_HOST")]
    pub host: String,

    /// Remote sampler base URL (mirror mode)
    #[arg(long, env = "MONITOR_SAMPLER")]
    pub sampler: Option<String>,

    /// API key sent to the remote sampler
    #[arg(long, env = "MONITOR_SAMPLER_KEY")]
    pub sampler_key: Option<String>,

    /// Sites file for local probing (local mode)
    #[arg(long, env = "MONITOR_SITES")]
    pub sites: Option<PathBuf>,

    /// Sampling period in seconds
    #[arg(long, default_value = "300", env = "MONITOR_PERIOD")]
    pub period: u64,

    /// Per-probe connect timeout in seconds (local mode)
    #[arg(long, default_value = "60", env = "MONITOR_TIMEOUT")]
    pub timeout: u64,

    /// Tracker base URL
    #[arg(long, default_value = "http://127.0.0.1:8091", env = "MONITOR_TRACKER")]
    pub tracker: String,

    /// API key sent to the tracker
    #[arg(long, env = "MONITOR_TRACKER_KEY")]
    pub tracker_key: Option<String>,

    /// Activity flush period in seconds
    #[arg(long, default_value = "30", env = "MONITOR_TRACKER_PERIOD")]
    pub tracker_period: u64,

    /// Token required in the `admin_token` header for admin queries
    #[arg(long, env = "MONITOR_ADMIN_TOKEN")]
    pub admin_token: Option<String>,
}

/// エンドポイント状態の取得方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMode {
    /// リモート sampler をミラーする
    Remote(String),
    /// サイトファイルを読み込んでローカルで計測する
    Local(PathBuf),
}

impl MonitorArgs {
    /// 待ち受けアドレス
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 計測周期
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period)
    }

    /// 計測タイムアウト
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// フラッシュ周期
    pub fn tracker_period(&self) -> Duration {
        Duration::from_secs(self.tracker_period)
    }

    /// `--sampler` と `--sites` のどちらか一方だけが指定されていることを確認する
    pub fn status_mode(&self) -> ScraperResult<StatusMode> {
        let sampler = self.sampler.as_deref().filter(|s| !s.is_empty());
        let sites = self.sites.as_ref().filter(|p| !p.as_os_str().is_empty());

        match (sampler, sites) {
            (Some(url), None) => Ok(StatusMode::Remote(url.to_string())),
            (None, Some(path)) => Ok(StatusMode::Local(path.clone())),
            (Some(_), Some(_)) => Err(ScraperError::Config(
                "--sampler and --sites are mutually exclusive".into(),
            )),
            (None, None) => Err(ScraperError::Config(
                "either --sampler or --sites is required".into(),
            )),
        }
    }
}
