//! Admin Gate Middleware
//!
//! `/api/admin/*` 요청 인증/인가
//!
//! # Flow
//!
//! ```text
//! Authorization: Bearer <token>
//!     → Auth provider 사용자 조회        실패 시 401 Authentication required
//!     → users 테이블 row 조회            없으면 401
//!     → status 확인                      suspended/banned → 403
//!     → role 확인                        admin/super_admin 아니면 403
//!     → AdminContext 를 request extension 에 저장
//! ```

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::db::{audit::NewAuditEntry, User};
use crate::error::ApiError;
use crate::middleware::rate_limit::client_key;
use crate::services::AuthProviderError;
use crate::types::{UserRole, UserStatus};
use crate::AppState;

/// 인증된 관리자 + 감사 로그용 요청 정보
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub user: User,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AdminContext {
    /// 이 관리자의 감사 로그 entry
    pub fn audit(&self, action: &str, resource_type: &str) -> NewAuditEntry {
        NewAuditEntry {
            user_id: Some(self.user.id),
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
            ..NewAuditEntry::new(action, resource_type)
        }
    }
}

/// `Authorization: Bearer <token>` 에서 토큰 추출
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// 정지/차단 계정 거부
pub fn require_active(user: &User) -> Result<(), ApiError> {
    match user.status.parse::<UserStatus>() {
        Ok(status) if !status.is_blocked() => Ok(()),
        _ => Err(ApiError::Forbidden("Account is suspended or banned".to_string())),
    }
}

/// admin / super_admin 만 허용
pub fn require_admin_role(user: &User) -> Result<(), ApiError> {
    match user.role.parse::<UserRole>() {
        Ok(role) if role.is_admin() => Ok(()),
        _ => Err(ApiError::Forbidden("Admin access required".to_string())),
    }
}

/// 토큰 → users row
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;

    let provider_user = state.auth.get_user(token).await.map_err(|e| {
        if let AuthProviderError::Transport(_) = e {
            tracing::error!(error = %e, "Auth provider request failed");
        }
        ApiError::Unauthorized
    })?;

    state
        .db
        .find_user(provider_user.id)
        .await?
        .ok_or(ApiError::Unauthorized)
}

pub async fn require_admin(State(state): State<AppState>, mut request: Request<Body>, next: Next) -> Response {
    let user = match authenticate(&state, request.headers()).await {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    if let Err(e) = require_active(&user).and_then(|_| require_admin_role(&user)) {
        tracing::warn!(user_id = %user.id, path = %request.uri().path(), "Admin access denied");
        return e.into_response();
    }

    let headers = request.headers();
    let context = AdminContext {
        ip_address: Some(client_key(headers)).filter(|ip| ip != "anonymous"),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        user,
    };
    request.extensions_mut().insert(context);

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: &str, status: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            full_name: None,
            avatar_url: None,
            wallet_address: None,
            plan: "free".to_string(),
            credits: 0,
            rate_limits: serde_json::json!({}),
            status: status.to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer jwt.token"));
        assert_eq!(bearer_token(&headers), Some("jwt.token"));
    }

    #[test]
    fn test_admin_roles_pass() {
        assert!(require_admin_role(&user("admin", "active")).is_ok());
        assert!(require_admin_role(&user("super_admin", "active")).is_ok());
    }

    #[test]
    fn test_plain_user_forbidden() {
        let err = require_admin_role(&user("user", "active")).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Forbidden: Admin access required");
    }

    #[test]
    fn test_blocked_account_forbidden() {
        for status in ["suspended", "banned"] {
            let err = require_active(&user("admin", status)).unwrap_err();
            assert_eq!(err.status(), StatusCode::FORBIDDEN);
        }
        assert!(require_active(&user("admin", "active")).is_ok());
    }

    #[test]
    fn test_audit_entry_carries_request_info() {
        let context = AdminContext {
            user: user("admin", "active"),
            ip_address: Some("203.0.113.7".to_string()),
            user_agent: Some("curl/8.0".to_string()),
        };
        let entry = context.audit("update_user", "user");
        assert_eq!(entry.user_id, Some(context.user.id));
        assert_eq!(entry.action, "update_user");
        assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.7"));
    }
}
