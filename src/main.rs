use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use guardian::api::routes::AppState;
use guardian::{api, config};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let state = Arc::new(AppState::from_config());
    tracing::info!(
        protocols = state.knowledge.protocols.len(),
        credentials = state.credentials.len(),
        model = %state.model,
        "State loaded"
    );
    if state.credentials.is_empty() {
        tracing::warn!(
            "No API keys discovered in the environment; requests must supply one manually"
        );
    }

    let addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Cannot bind {addr}: {e}"));
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, api::routes::router(state))
        .await
        .unwrap_or_else(|e| panic!("Server error: {e}"));
}
