use std::sync::Arc;

use anyhow::Context;
use tokio::{net::TcpListener, signal, sync::mpsc};
use tracing::info;

use express_checkout as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(&cfg.log_level);

    let db = api::db::establish_connection(&cfg.database_url)
        .await
        .context("failed to connect to database")?;
    if cfg.auto_migrate {
        api::db::create_schema(&db)
            .await
            .context("failed to create schema")?;
    }
    let db = Arc::new(db);

    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    let event_sender = api::events::EventSender::new(event_tx);
    tokio::spawn(api::events::process_events(event_rx));

    let state = Arc::new(api::AppState::new(
        db.clone(),
        Arc::new(cfg.clone()),
        event_sender,
        Arc::new(api::services::EnabledGateways),
        Arc::new(api::services::ManualGateway),
    ));

    // Offer paths are registered once at startup; configuration changes
    // require a rebuild (admin tooling calls it, or restart).
    state.offer_routes.rebuild(&db).await?;

    let app = api::app(state);
    let addr = cfg.server_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl-c");
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
    info!("shutdown signal received");
}
