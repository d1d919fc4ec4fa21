//! HTTP server lifecycle.

use std::sync::Arc;

use aide::openapi::OpenApi;
use anyhow::Context;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;
use voltra_server::handler;
use voltra_server::service::ServiceState;

use crate::TRACING_TARGET_SHUTDOWN;
use crate::config::ServerConfig;

/// Finalizes the API router into a serving router with OpenAPI docs.
pub fn build_router(state: ServiceState) -> Router {
    let mut api = OpenApi::default();

    handler::routes()
        .finish_api_with(&mut api, |api| {
            api.title("Voltra API")
                .description("Multi-tenant energy analytics with a data assistant")
        })
        .layer(Extension(Arc::new(api)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router until a shutdown signal arrives.
pub async fn serve(router: Router, config: &ServerConfig) -> anyhow::Result<()> {
    let address = config.bind_address();

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(address = %address, "Listening for connections");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
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

    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        "Shutdown signal received, draining connections"
    );
}
