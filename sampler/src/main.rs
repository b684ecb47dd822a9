//! Scraper Sampler Entry Point

use clap::Parser;
use scraper_common::auth::ApiKey;
use scraper_common::error::ScraperResult;
use scraper_common::shutdown::ShutdownController;
use scraper_common::{logging, server};
use scraper_sampler::cli::SamplerArgs;
use scraper_sampler::{api, sites, ProbeManager};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = SamplerArgs::parse();

    let _log_guard = match logging::init("sampler") {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args).await {
        error!(error = %e, "Sampler terminated with error");
        std::process::exit(1);
    }
}

async fn run(args: SamplerArgs) -> ScraperResult<()> {
    let addresses = sites::load_sites(&args.file)?;
    let manager = Arc::new(ProbeManager::new(args.period(), args.timeout(), &addresses)?);

    let listener = server::bind(&args.bind_addr()).await?;
    manager.run().await;

    let app = api::create_router(manager.clone(), ApiKey::new(args.key.as_deref()));
    let result = server::serve("sampler", app, listener, ShutdownController::default()).await;

    manager.stop().await;
    info!("Sampler stopped");
    result
}
