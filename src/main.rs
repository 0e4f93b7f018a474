mod config;
mod dataset;
mod errors;
mod rebase;
mod server;
mod state;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("backtest dashboard starting");

    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    // Initial dataset (generation 1). Nothing to serve without it.
    let initial = match dataset::loader::load_dataset(&cfg.data_path, 1) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(path = %cfg.data_path.display(), "dataset load error: {e}");
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(cfg.clone(), initial);

    // ── Spawn tasks ──

    let watcher_state = app_state.clone();
    tokio::spawn(async move {
        dataset::watcher::run_dataset_watcher(watcher_state).await;
    });

    // ── Axum HTTP + WS server ──

    let app = server::router(app_state);

    let addr = format!("0.0.0.0:{}", cfg.server_port);
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
