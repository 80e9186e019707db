//! Health Check Endpoint
//!
//! DB ping + 외부 서비스 설정 여부
//!
//! DB가 응답하지 않아도 200 (status: degraded), 로드밸런서가 본문으로 판단

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health check 응답
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseStatus,
    pub integrations: Integrations,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct DatabaseStatus {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// 키가 설정된 외부 연동
#[derive(Serialize)]
pub struct Integrations {
    pub openai: bool,
    pub checkout: bool,
    pub crypto_payments: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_start = std::time::Instant::now();
    let database = match state.db.health_check().await {
        Ok(_) => DatabaseStatus {
            connected: true,
            latency_ms: Some(db_start.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            DatabaseStatus {
                connected: false,
                latency_ms: None,
            }
        }
    };

    Json(HealthResponse {
        status: if database.connected { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
        integrations: Integrations {
            openai: state.openai.is_configured(),
            checkout: state.payments.checkout_enabled(),
            crypto_payments: state.payments.crypto_enabled(),
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
