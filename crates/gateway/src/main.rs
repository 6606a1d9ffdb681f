mod cli;
mod net;
mod rounds;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mapdart_server::{Server, ServerConfig};
use mapdart_wire::{ServerEnvelope, encode_frame};
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let settings = cli::get_settings();

    tracing_subscriber::fmt()
        .with_max_level(settings.log_level.as_tracing())
        .init();

    info!("starting Mapdart gateway");

    let server = Server::new(ServerConfig {
        seed: settings.seed,
        guess_duration_secs: settings.round_secs as u32,
        ..ServerConfig::default()
    });
    let state = Arc::new(net::AppState::new(server));

    info!(round_secs = settings.round_secs, "starting round driver");
    tokio::spawn(rounds::drive(
        Arc::clone(&state),
        Duration::from_secs(settings.round_secs),
    ));

    let app = net::router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", settings.port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    info!("exit imminent");
    Ok(())
}

/// Wait for SIGINT/SIGTERM, then say goodbye to every connected client
/// before letting the server stop accepting.
async fn shutdown_signal(state: Arc<net::AppState>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("termination signal received, starting graceful shutdown");

    let kicks = state.server.read().await.shutdown_kicks();
    for (session_id, kick) in kicks {
        state
            .send_to(session_id, encode_frame(&ServerEnvelope::kick(kick)))
            .await;
        state.unregister(session_id).await;
    }

    // Give the farewell frames a moment to flush.
    tokio::time::sleep(Duration::from_millis(500)).await;
}
