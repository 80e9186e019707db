//! Admin: 감사 로그 조회/기록

use axum::{
    extract::{Extension, State},
    Json,
};

use crate::db::{
    audit::{AuditFilter, NewAuditEntry},
    AuditLog,
};
use crate::error::ApiError;
use crate::middleware::AdminContext;
use crate::routes::{required, ApiJson, ApiQuery};
use crate::AppState;

/// GET /api/admin/logs?user_id=&agent_id=&action=&resource_type=&status=&limit=
pub async fn get_audit_logs(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<AuditFilter>,
) -> Result<Json<Vec<AuditLog>>, ApiError> {
    Ok(Json(state.db.get_audit_logs(&filter).await?))
}

/// POST /api/admin/logs
///
/// user_id 가 없으면 요청한 관리자로 기록. ip/user agent 는 항상 요청 기준
pub async fn log_audit_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiJson(entry): ApiJson<NewAuditEntry>,
) -> Result<Json<AuditLog>, ApiError> {
    if required(Some(entry.action.as_str())).is_none() || required(Some(entry.resource_type.as_str())).is_none() {
        return Err(ApiError::BadRequest("action and resource_type are required".to_string()));
    }

    let entry = NewAuditEntry {
        user_id: entry.user_id.or(Some(ctx.user.id)),
        ip_address: ctx.ip_address.clone(),
        user_agent: ctx.user_agent.clone(),
        ..entry
    };
    Ok(Json(state.db.log_audit_event(&entry).await?))
}
