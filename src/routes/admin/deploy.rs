//! Admin: 배포 점검
//!
//! - 배포 설정 검증 (누락 필드를 모두 모아서 반환)
//! - DB 연결 확인
//! - 마이그레이션 실행

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::config::Environment;
use crate::error::ApiError;
use crate::routes::{required, ApiJson, MessageResponse};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DeployConfig {
    pub environment: Option<String>,
    pub database_url: Option<String>,
    pub auth_url: Option<String>,
    pub auth_key: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseCheck {
    pub connected: bool,
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 첫 에러에서 멈추지 않고 전부 수집
pub fn validate_deploy_config(config: &DeployConfig) -> ValidationReport {
    let mut errors = Vec::new();

    match required(config.environment.as_deref()) {
        None => errors.push("environment is required".to_string()),
        Some(env) if Environment::parse(env).is_none() => errors.push(format!(
            "Invalid environment '{}'. Must be one of: development, staging, production",
            env
        )),
        Some(_) => {}
    }

    let fields = [
        ("database_url", &config.database_url),
        ("auth_url", &config.auth_url),
        ("auth_key", &config.auth_key),
    ];
    for (name, value) in fields {
        if required(value.as_deref()).is_none() {
            errors.push(format!("{} is required", name));
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

/// POST /api/admin/deploy/validate
pub async fn validate_config(ApiJson(config): ApiJson<DeployConfig>) -> Json<ValidationReport> {
    Json(validate_deploy_config(&config))
}

/// GET /api/admin/deploy/database
pub async fn check_database_connection(State(state): State<AppState>) -> Json<DatabaseCheck> {
    let started = std::time::Instant::now();
    match state.db.health_check().await {
        Ok(()) => Json(DatabaseCheck {
            connected: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Database connection check failed");
            Json(DatabaseCheck {
                connected: false,
                latency_ms: None,
                error: Some(e.to_string()),
            })
        }
    }
}

/// POST /api/admin/deploy/migrate
pub async fn run_migrations(State(state): State<AppState>) -> Result<Json<MessageResponse>, ApiError> {
    state.db.run_migrations().await.map_err(|e| {
        tracing::error!(error = %e, "Migration failed");
        ApiError::DatabaseError("Migration failed".to_string())
    })?;
    tracing::info!("Migrations applied");
    Ok(Json(MessageResponse::ok("Migrations completed")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> DeployConfig {
        DeployConfig {
            environment: Some("production".to_string()),
            database_url: Some("postgres://db/agentic".to_string()),
            auth_url: Some("https://auth.example.com".to_string()),
            auth_key: Some("anon".to_string()),
        }
    }

    #[test]
    fn test_valid_config() {
        let report = validate_deploy_config(&full_config());
        assert_eq!(report, ValidationReport { valid: true, errors: vec![] });
    }

    #[test]
    fn test_collects_every_error() {
        let report = validate_deploy_config(&DeployConfig::default());
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![
                "environment is required",
                "database_url is required",
                "auth_url is required",
                "auth_key is required",
            ]
        );
    }

    #[test]
    fn test_invalid_environment() {
        let config = DeployConfig {
            environment: Some("prod-eu".to_string()),
            ..full_config()
        };
        let report = validate_deploy_config(&config);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Invalid environment 'prod-eu'"));
    }
}
