//! Scraper Tracker Entry Point

use clap::Parser;
use scraper_common::auth::ApiKey;
use scraper_common::error::ScraperResult;
use scraper_common::shutdown::ShutdownController;
use scraper_common::{logging, server};
use scraper_tracker::cli::TrackerArgs;
use scraper_tracker::db::{self, requests::RequestCountStorage};
use scraper_tracker::{api, AppState};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = TrackerArgs::parse();

    let _log_guard = match logging::init("tracker") {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args).await {
        error!(error = %e, "Tracker terminated with error");
        std::process::exit(1);
    }
}

async fn run(args: TrackerArgs) -> ScraperResult<()> {
    let pool = db::create_pool(&args.database_url).await?;
    info!(database = %args.database_url, "Database ready");

    let state = AppState {
        storage: RequestCountStorage::new(pool.clone()),
    };
    let app = api::create_router(state, ApiKey::new(args.key.as_deref()));

    let listener = server::bind(&args.bind_addr()).await?;
    let result = server::serve("tracker", app, listener, ShutdownController::default()).await;

    pool.close().await;
    info!("Tracker stopped");
    result
}
