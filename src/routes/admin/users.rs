//! Admin: 사용자 관리

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::{
    users::{UserFilter, UserUpdate, UserUsage},
    Invoice, User,
};
use crate::error::ApiError;
use crate::middleware::AdminContext;
use crate::routes::{required, ApiJson, ApiPath, ApiQuery};
use crate::types::{text_filter, PageRequest, Plan, UserRole, UserStatus};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
    pub plan: Option<String>,
}

impl UserListQuery {
    fn filter(&self) -> UserFilter {
        UserFilter {
            search: self.search.clone(),
            status: text_filter(self.status.as_deref()),
            role: text_filter(self.role.as_deref()),
            plan: text_filter(self.plan.as_deref()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total_pages: i64,
    pub total: i64,
}

/// PATCH body: 문자열 그대로 받아서 허용 값 검증
#[derive(Debug, Default, Deserialize)]
pub struct UserPatch {
    pub status: Option<String>,
    pub role: Option<String>,
}

impl UserPatch {
    /// 허용 값 검사 후 UserUpdate 로 변환 (빈 문자열은 미지정, 변경 없음 → 400)
    pub fn into_update(self) -> Result<UserUpdate, ApiError> {
        let status = required(self.status.as_deref())
            .map(|s| {
                s.parse::<UserStatus>()
                    .map_err(|_| ApiError::BadRequest(format!("Invalid status. Must be one of: {}", UserStatus::allowed())))
            })
            .transpose()?;
        let role = required(self.role.as_deref())
            .map(|r| {
                r.parse::<UserRole>()
                    .map_err(|_| ApiError::BadRequest(format!("Invalid role. Must be one of: {}", UserRole::allowed())))
            })
            .transpose()?;

        let update = UserUpdate {
            status,
            role,
            ..UserUpdate::default()
        };
        if update.is_empty() {
            return Err(ApiError::BadRequest("No valid updates provided".to_string()));
        }
        Ok(update)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreditsRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub plan: Plan,
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let filter = query.filter();
    let page = PageRequest::new(query.page);
    let (users, total) = state.db.list_users(&filter, page).await?;

    Ok(Json(UserListResponse {
        users,
        total_pages: page.total_pages(total),
        total,
    }))
}

/// GET /api/admin/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.db.get_user(id).await?))
}

/// PUT /api/admin/users/:id
///
/// 전체 필드 부분 업데이트 (credits, plan, status, role, rate_limits)
pub async fn update_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    if update.is_empty() {
        return Err(ApiError::BadRequest("No valid updates provided".to_string()));
    }
    let user = state.db.update_user(id, &update).await?;
    let details = json!({
        "credits": update.credits,
        "plan": update.plan,
        "status": update.status,
        "role": update.role,
    });
    audit_user(&state, &ctx, "update_user", id, details).await;
    Ok(Json(user))
}

/// PATCH /api/admin/users/:id
pub async fn patch_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<Json<User>, ApiError> {
    let update = patch.into_update()?;
    let user = state.db.update_user(id, &update).await?;

    audit_user(&state, &ctx, "update_user", id, json!({ "status": update.status, "role": update.role })).await;
    tracing::info!(admin_id = %ctx.user.id, user_id = %id, "User updated");
    Ok(Json(user))
}

/// POST /api/admin/users/:id/credits
pub async fn adjust_credits(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreditsRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state.db.adjust_credits(id, req.delta).await?;
    audit_user(&state, &ctx, "adjust_credits", id, json!({ "delta": req.delta, "credits": user.credits })).await;
    Ok(Json(user))
}

/// POST /api/admin/users/:id/plan
pub async fn adjust_plan(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<PlanRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state.db.set_user_plan(id, req.plan).await?;
    audit_user(&state, &ctx, "adjust_plan", id, json!({ "plan": req.plan })).await;
    Ok(Json(user))
}

/// POST /api/admin/users/:id/freeze
pub async fn freeze_account(
    state: State<AppState>,
    ctx: Extension<AdminContext>,
    id: ApiPath<Uuid>,
) -> Result<Json<User>, ApiError> {
    set_status(state, ctx, id, UserStatus::Suspended, "freeze_account").await
}

/// POST /api/admin/users/:id/unfreeze
pub async fn unfreeze_account(
    state: State<AppState>,
    ctx: Extension<AdminContext>,
    id: ApiPath<Uuid>,
) -> Result<Json<User>, ApiError> {
    set_status(state, ctx, id, UserStatus::Active, "unfreeze_account").await
}

/// POST /api/admin/users/:id/ban
pub async fn ban_account(
    state: State<AppState>,
    ctx: Extension<AdminContext>,
    id: ApiPath<Uuid>,
) -> Result<Json<User>, ApiError> {
    set_status(state, ctx, id, UserStatus::Banned, "ban_account").await
}

/// GET /api/admin/users/:id/usage
pub async fn get_usage(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<UserUsage>, ApiError> {
    Ok(Json(state.db.get_user_usage(id).await?))
}

/// GET /api/admin/users/:id/billing
pub async fn get_billing_history(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    Ok(Json(state.db.get_user_billing_history(id).await?))
}

async fn set_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    status: UserStatus,
    action: &str,
) -> Result<Json<User>, ApiError> {
    let user = state.db.set_user_status(id, status).await?;
    audit_user(&state, &ctx, action, id, json!({ "status": status })).await;
    tracing::info!(admin_id = %ctx.user.id, user_id = %id, status = %status, "User status changed");
    Ok(Json(user))
}

async fn audit_user(state: &AppState, ctx: &AdminContext, action: &str, user_id: Uuid, details: Value) {
    super::audit(state, ctx, action, "user", user_id, details).await;
}
