//! axumサーバー起動・シャットダウンハンドリング

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::{ScraperError, ScraperResult};
use crate::shutdown::ShutdownController;

/// 指定アドレスで待ち受ける
pub async fn bind(bind_addr: &str) -> ScraperResult<TcpListener> {
    TcpListener::bind(bind_addr)
        .await
        .map_err(|e| ScraperError::Config(format!("failed to bind {bind_addr}: {e}")))
}

/// axumサーバーを起動し、シャットダウンシグナルを待機する
///
/// 処理中のリクエストが完了してから戻る。
pub async fn serve(
    service: &str,
    app: Router,
    listener: TcpListener,
    shutdown: ShutdownController,
) -> ScraperResult<()> {
    let local = listener.local_addr()?;
    info!(service, addr = %local, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!(service, "Server shutdown complete");
    Ok(())
}

/// シャットダウンシグナルを待機
async fn shutdown_signal(shutdown: ShutdownController) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
        _ = shutdown.wait() => {
            info!("Shutdown requested, shutting down...");
        }
    }
    shutdown.request_shutdown();
}
