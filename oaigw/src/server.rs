//! axumサーバー起動・シャットダウンハンドリング

use crate::shutdown::ShutdownController;
use crate::AppState;
use tokio::net::TcpListener;
use tracing::info;

/// アドレスにバインドしてサーバーを起動し、シャットダウンまで待つ
pub async fn run(state: AppState, bind_addr: &str, shutdown: ShutdownController) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    serve(listener, state, shutdown).await
}

/// バインド済みのリスナーでサーバーを起動する
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: ShutdownController,
) -> std::io::Result<()> {
    let app = crate::api::create_app(state);

    info!("oaigw listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// シャットダウンシグナルを待機
async fn shutdown_signal(shutdown: ShutdownController) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
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
}
