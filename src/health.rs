//! Health check module
//! Provides health status for the application and the order store.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::error;

use crate::orders::OrderStore;

/// Health status response
#[derive(Debug, Serialize, Clone)]
pub struct HealthStatus {
    pub status: HealthState,
    pub checks: HashMap<String, ComponentHealth>,
    pub uptime_secs: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Overall health state
#[derive(Debug, Serialize, Clone)]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthState::Healthy)
    }
}

/// Individual component health status
#[derive(Debug, Serialize, Clone)]
pub struct ComponentHealth {
    pub status: ComponentState,
    pub response_time_ms: Option<u128>,
    pub details: Option<String>,
}

/// Component state
#[derive(Debug, Serialize, Clone)]
pub enum ComponentState {
    Up,
    Down,
}

impl ComponentHealth {
    pub fn up(response_time_ms: Option<u128>) -> Self {
        Self {
            status: ComponentState::Up,
            response_time_ms,
            details: None,
        }
    }

    pub fn down(details: Option<String>) -> Self {
        Self {
            status: ComponentState::Down,
            response_time_ms: None,
            details,
        }
    }
}

/// Health checker for the application
#[derive(Clone)]
pub struct HealthChecker {
    store: Arc<dyn OrderStore>,
    started_at: Instant,
}

impl HealthChecker {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self {
            store,
            started_at: Instant::now(),
        }
    }

    pub async fn check_health(&self) -> HealthStatus {
        let mut checks = HashMap::new();
        let mut overall_healthy = true;

        let probe_started = Instant::now();
        match timeout(Duration::from_secs(5), self.store.find_by_id(0)).await {
            Ok(Ok(_)) => {
                checks.insert(
                    "order_store".to_string(),
                    ComponentHealth::up(Some(probe_started.elapsed().as_millis())),
                );
            }
            Ok(Err(e)) => {
                overall_healthy = false;
                checks.insert(
                    "order_store".to_string(),
                    ComponentHealth::down(Some(e.to_string())),
                );
                error!("order store health check failed: {}", e);
            }
            Err(_) => {
                overall_healthy = false;
                checks.insert(
                    "order_store".to_string(),
                    ComponentHealth::down(Some("Timeout".to_string())),
                );
                error!("order store health check timed out");
            }
        }

        HealthStatus {
            status: if overall_healthy {
                HealthState::Healthy
            } else {
                HealthState::Unhealthy
            },
            checks,
            uptime_secs: self.started_at.elapsed().as_secs(),
            timestamp: chrono::Utc::now(),
        }
    }
}
