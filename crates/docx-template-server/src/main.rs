//! HTTP server for docx-template.
//!
//! This server:
//! - Accepts a .docx template and a JSON placeholder map on POST /build
//! - Fills the template, preserving the formatting of every placeholder
//! - Returns the PDF rendering (or the DOCX with ?format=docx)
//! - Serves the plugin manifest under /.well-known

use clap::Parser;
use docx_template_core::ConversionChain;
use docx_template_server::{app, AppState, Config};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    info!(
        "Starting docx-template-server v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("  Host: {}", config.host);
    info!("  Port: {}", config.port);

    let chain = ConversionChain::from_config(&config.chain_config());
    let available = chain.available();
    if available.is_empty() {
        warn!("  Converters: none found, POST /build?format=pdf will fail");
    } else {
        info!("  Converters: {}", available.join(", "));
    }

    let state = AppState::new(chain, config.package_options());
    let router = app(state, &config.static_dir, config.max_upload_bytes);

    // Bind and serve
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, initiating shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, initiating shutdown");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
