//! Liveness and readiness probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;

use super::state::AppState;

#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Probe body. `checks` and `latency_ms` only appear on the readiness
/// endpoint, which actually touches dependencies.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl HealthResponse {
    fn bare(status: HealthStatus) -> Self {
        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            checks: None,
            latency_ms: None,
        }
    }
}

/// One dependency's verdict inside a readiness response
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

/// GET /health. Always 200 while the process can serve requests.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse::bare(HealthStatus::Healthy)))
}

/// GET /live. Body-less liveness probe.
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /ready. Exercises the key store and reports per-dependency
/// results; 503 when any dependency fails.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let checks = vec![check_key_store(&state).await];

    let all_healthy = checks.iter().all(|c| c.status == HealthStatus::Healthy);
    let (status, code) = if all_healthy {
        (HealthStatus::Healthy, StatusCode::OK)
    } else {
        (HealthStatus::Unhealthy, StatusCode::SERVICE_UNAVAILABLE)
    };

    let body = HealthResponse {
        checks: Some(checks),
        latency_ms: Some(started.elapsed().as_millis() as u64),
        ..HealthResponse::bare(status)
    };

    (code, Json(body))
}

async fn check_key_store(state: &AppState) -> HealthCheck {
    let started = Instant::now();
    let outcome = state.api_key_service.stats().await;

    HealthCheck {
        name: "key_store",
        status: if outcome.is_ok() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        },
        message: outcome.err().map(|e| e.to_string()),
        latency_ms: started.elapsed().as_millis() as u64,
    }
}
