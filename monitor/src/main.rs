//! Scraper Monitor Entry Point

use clap::Parser;
use scraper_common::error::{ScraperError, ScraperResult};
use scraper_common::shutdown::ShutdownController;
use scraper_common::{logging, server};
use scraper_monitor::aggregator::ActivityTracker;
use scraper_monitor::api::{self, AppState};
use scraper_monitor::cli::{MonitorArgs, StatusMode};
use scraper_monitor::collector::CollectorClient;
use scraper_monitor::remote::RemoteSampler;
use scraper_monitor::source::EndpointStatus;
use scraper_monitor::Monitor;
use scraper_sampler::{sites, ProbeManager};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = MonitorArgs::parse();

    let _log_guard = match logging::init("monitor") {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args).await {
        error!(error = %e, "Monitor terminated with error");
        std::process::exit(1);
    }
}

fn build_status(args: &MonitorArgs) -> ScraperResult<Arc<dyn EndpointStatus>> {
    match args.status_mode()? {
        StatusMode::Remote(url) => {
            info!(sampler = %url, "Mirroring remote sampler");
            let remote = RemoteSampler::new(&url, args.sampler_key.as_deref(), args.period())?;
            Ok(Arc::new(remote))
        }
        StatusMode::Local(path) => {
            info!(sites = %path.display(), "Probing endpoints locally");
            let addresses = sites::load_sites(&path)?;
            let manager = ProbeManager::new(args.period(), args.timeout(), &addresses)?;
            Ok(Arc::new(manager))
        }
    }
}

async fn run(args: MonitorArgs) -> ScraperResult<()> {
    if args.tracker_period == 0 {
        return Err(ScraperError::Config("tracker period must be positive".into()));
    }

    let status = build_status(&args)?;
    let collector = CollectorClient::new(&args.tracker, args.tracker_key.as_deref())?;
    let activity = ActivityTracker::new(args.tracker_period(), collector.clone());
    let monitor = Arc::new(Monitor::new(status, activity, collector));

    let listener = server::bind(&args.bind_addr()).await?;
    monitor.start().await;

    let app = api::create_router(AppState::new(monitor.clone(), args.admin_token.as_deref()));
    let result = server::serve("monitor", app, listener, ShutdownController::default()).await;

    monitor.stop().await;
    info!("Monitor stopped");
    result
}
