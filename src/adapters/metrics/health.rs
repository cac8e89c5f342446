//! Health Check Server - Liveness and Readiness Probes
//!
//! Exposes /live and /ready endpoints via axum 0.7. Readiness depends on
//! the full node being reachable and the last sweep having completed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tracing::{info, instrument};

/// Shared health state polled by readiness probes.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Whether the full node answered the last health check.
    pub gateway_healthy: Arc<AtomicBool>,
    /// Whether at least one sweep has completed.
    pub swept_once: Arc<AtomicBool>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Gateway assumed healthy, no sweep completed yet.
    pub fn new() -> Self {
        Self {
            gateway_healthy: Arc::new(AtomicBool::new(true)),
            swept_once: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_gateway_healthy(&self, healthy: bool) {
        self.gateway_healthy.store(healthy, Ordering::Relaxed);
    }

    pub fn mark_swept(&self) {
        self.swept_once.store(true, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.gateway_healthy.load(Ordering::Relaxed) && self.swept_once.load(Ordering::Relaxed)
    }
}

/// Axum-based health check HTTP server.
pub struct HealthServer {
    state: Arc<HealthState>,
    port: u16,
}

impl HealthServer {
    pub fn new(state: Arc<HealthState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Serve until the shutdown signal fires.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .with_state(Arc::clone(&self.state));

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    async fn readiness(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
        if state.is_ready() {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_until_first_sweep() {
        let state = HealthState::new();
        assert!(!state.is_ready());
        state.mark_swept();
        assert!(state.is_ready());
        state.set_gateway_healthy(false);
        assert!(!state.is_ready());
    }
}
