use axum::{
    routing::{get, post},
    Json, Router,
};
use http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use onepay_gateway::api::callbacks::{handle_onepay_callback, CallbackState};
use onepay_gateway::config::AppConfig;
use onepay_gateway::events::EventBus;
use onepay_gateway::health::{HealthChecker, HealthStatus};
use onepay_gateway::logging::init_tracing;
use onepay_gateway::orders::MemoryOrderStore;
use onepay_gateway::services::CallbackProcessor;

#[derive(Clone, Copy)]
struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

#[derive(Clone)]
struct AppState {
    health_checker: HealthChecker,
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
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

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    config.validate()?;

    init_tracing(&config.logging);
    info!("Configuration loaded and validated");
    info!(gateway = ?config.gateway, "gateway settings");

    let store = MemoryOrderStore::shared();
    let events = EventBus::default();
    let processor = Arc::new(CallbackProcessor::new(
        config.gateway.clone(),
        store.clone(),
        events,
    ));
    let health_checker = HealthChecker::new(store);

    let callback_routes = Router::new()
        .route("/callbacks/onepay", post(handle_onepay_callback))
        .with_state(CallbackState { processor });

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(callback_routes)
        .with_state(AppState { health_checker })
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!(address = %addr, error = %e, "failed to bind listener");
        e
    })?;

    info!(address = %addr, "server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn root() -> &'static str {
    "OnePay Gateway API"
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<HealthStatus>, (axum::http::StatusCode, String)> {
    let health_status = state.health_checker.check_health().await;

    // Return 503 if any component is unhealthy
    if !health_status.is_healthy() {
        error!("health check failed, service unhealthy");
        Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable".to_string(),
        ))
    } else {
        Ok(Json(health_status))
    }
}
