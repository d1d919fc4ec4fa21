//! Health handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use voltra_core::ServiceStatus;

use crate::handler::Result;
use crate::handler::response::{ComponentHealth, HealthResponse};
use crate::service::ServiceState;

/// Reports liveness plus per-component health.
async fn get_health(
    State(state): State<ServiceState>,
) -> Result<(StatusCode, Json<HealthResponse>)> {
    let mut components = Vec::new();

    components.push(match state.postgres.get_connection().await {
        Ok(_) => ComponentHealth {
            component: "postgres".into(),
            status: ServiceStatus::Healthy,
            detail: None,
        },
        Err(e) => ComponentHealth {
            component: "postgres".into(),
            status: ServiceStatus::Unhealthy,
            detail: Some(e.to_string()),
        },
    });

    components.push(match state.vector.list_collections().await {
        Ok(collections) => ComponentHealth {
            component: "vector".into(),
            status: ServiceStatus::Healthy,
            detail: Some(format!("{} collections", collections.len())),
        },
        Err(e) => ComponentHealth {
            component: "vector".into(),
            status: ServiceStatus::Unhealthy,
            detail: Some(e.to_string()),
        },
    });

    components.push(match state.sandbox.health_check().await {
        Ok(()) => ComponentHealth {
            component: "sandbox".into(),
            status: ServiceStatus::Healthy,
            detail: None,
        },
        Err(e) => ComponentHealth {
            component: "sandbox".into(),
            status: ServiceStatus::Degraded,
            detail: Some(e.to_string()),
        },
    });

    let status = if components
        .iter()
        .any(|c| c.status == ServiceStatus::Unhealthy)
    {
        ServiceStatus::Unhealthy
    } else if components
        .iter()
        .any(|c| c.status == ServiceStatus::Degraded)
    {
        ServiceStatus::Degraded
    } else {
        ServiceStatus::Healthy
    };

    let code = if status == ServiceStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    Ok((code, Json(HealthResponse { status, components })))
}

fn get_health_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Health check")
        .description("Reports liveness plus component health for postgres, the vector backend, and the sandbox.")
        .response::<200, Json<HealthResponse>>()
        .response::<503, Json<HealthResponse>>()
}

/// Returns a [`Router`] with all related routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/health", get_with(get_health, get_health_docs))
        .with_path_items(|item| item.tag("Monitoring"))
}
