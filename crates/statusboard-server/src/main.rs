use tracing_subscriber::EnvFilter;

use statusboard_server::config::ServerConfig;
use statusboard_server::{build_app, seed_event_log};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("STATUSBOARD_LOG_FORMAT").is_ok_and(|f| f == "json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = ServerConfig::load();
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {e}");
        std::process::exit(1);
    }
    let listen_addr = config.listen_addr.clone();

    let (app, state) = build_app(config);
    match seed_event_log(&state).await {
        Ok(0) => {},
        Ok(rows) => tracing::info!(rows, "Initial agent statuses written"),
        Err(e) => tracing::warn!("Failed to seed event log: {e}"),
    }

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %listen_addr, "Failed to bind: {e}");
            std::process::exit(1);
        },
    };

    tracing::info!(
        addr = %listen_addr,
        log = %state.config.log_path.display(),
        agents = state.config.agents.len(),
        "Statusboard server listening"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down");
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}
