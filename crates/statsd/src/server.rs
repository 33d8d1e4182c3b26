//! HTTP/WebSocket server for statsd.

use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::StatsdConfig;
use crate::routes;
use crate::store::IncidentStore;

/// Application state shared across handlers.
pub struct AppState {
    pub store: IncidentStore,
    pub config: StatsdConfig,
}

pub type AppStateArc = Arc<AppState>;

impl AppState {
    pub fn new(store: IncidentStore, config: StatsdConfig) -> Self {
        Self { store, config }
    }
}

/// Builds the full router. Separate from `run` so tests can drive it
/// with `tower::ServiceExt::oneshot`.
pub fn router(state: AppStateArc) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .merge(routes::ws_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the server until ctrl-c.
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.bind_addr.clone();
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down gracefully");
}
