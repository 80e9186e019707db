//! `users` 테이블 쿼리

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{escape_like, push_eq, Database, User};
use crate::types::{PageRequest, Plan, UserRole, UserStatus};

/// 사용자 목록 필터
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// email / full_name 부분 일치 (대소문자 무시)
    pub search: Option<String>,
    /// 아래 필터는 값 그대로 비교 (알 수 없는 값이면 빈 결과)
    pub status: Option<String>,
    pub role: Option<String>,
    pub plan: Option<String>,
}

/// 사용자 부분 업데이트 (None 필드는 유지)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub credits: Option<i64>,
    pub plan: Option<Plan>,
    pub status: Option<UserStatus>,
    pub role: Option<UserRole>,
    pub rate_limits: Option<Value>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.credits.is_none()
            && self.plan.is_none()
            && self.status.is_none()
            && self.role.is_none()
            && self.rate_limits.is_none()
    }
}

/// 신규 가입/지갑 로그인 시 생성되는 사용자
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Option<Uuid>,
    pub email: String,
    pub full_name: Option<String>,
    pub wallet_address: Option<String>,
}

/// 사용량 요약
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUsage {
    pub transactions: i64,
    pub api_calls: i64,
    pub agent_executions: i64,
}

fn push_user_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &UserFilter) {
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR full_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    push_eq(qb, "status", filter.status.clone());
    push_eq(qb, "role", filter.role.clone());
    push_eq(qb, "plan", filter.plan.clone());
}

/// 페이지 조회 쿼리 (created_at 내림차순)
pub(crate) fn list_users_query<'a>(filter: &UserFilter, page: PageRequest) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM users WHERE TRUE");
    push_user_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    qb
}

/// 같은 필터의 전체 개수 쿼리
pub(crate) fn count_users_query<'a>(filter: &UserFilter) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE TRUE");
    push_user_filters(&mut qb, filter);
    qb
}

impl Database {
    /// 사용자 목록 (페이지네이션) → (rows, 전체 개수)
    pub async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<(Vec<User>, i64)> {
        let users = list_users_query(filter, page)
            .build_query_as::<User>()
            .fetch_all(self.pool())
            .await?;

        let (total,) = count_users_query(filter)
            .build_query_as::<(i64,)>()
            .fetch_one(self.pool())
            .await?;

        Ok((users, total))
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(user)
    }

    pub async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    pub async fn find_user_by_wallet(&self, wallet_address: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE wallet_address = $1")
            .bind(wallet_address)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    /// 사용자 row 생성
    ///
    /// id가 주어지면 auth provider의 사용자 id를 그대로 사용
    pub async fn insert_user(&self, new_user: &NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, full_name, wallet_address)
            VALUES (COALESCE($1, gen_random_uuid()), $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(new_user.id)
        .bind(&new_user.email)
        .bind(&new_user.full_name)
        .bind(&new_user.wallet_address)
        .fetch_one(self.pool())
        .await?;
        Ok(user)
    }

    pub async fn update_user(&self, id: Uuid, update: &UserUpdate) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                credits = COALESCE($2, credits),
                plan = COALESCE($3, plan),
                status = COALESCE($4, status),
                role = COALESCE($5, role),
                rate_limits = COALESCE($6, rate_limits),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.credits)
        .bind(update.plan.map(|p| p.as_str()))
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.role.map(|r| r.as_str()))
        .bind(&update.rate_limits)
        .fetch_one(self.pool())
        .await?;
        Ok(user)
    }

    /// 크레딧 조정: 현재 값을 읽은 뒤 max(0, credits + delta) 로 기록
    pub async fn adjust_credits(&self, id: Uuid, delta: i64) -> Result<User> {
        let user = self.get_user(id).await?;
        let update = UserUpdate {
            credits: Some(next_credits(user.credits, delta)),
            ..Default::default()
        };
        self.update_user(id, &update).await
    }

    pub async fn set_user_status(&self, id: Uuid, status: UserStatus) -> Result<User> {
        let update = UserUpdate {
            status: Some(status),
            ..Default::default()
        };
        self.update_user(id, &update).await
    }

    pub async fn set_user_plan(&self, id: Uuid, plan: Plan) -> Result<User> {
        let update = UserUpdate {
            plan: Some(plan),
            ..Default::default()
        };
        self.update_user(id, &update).await
    }

    /// 사용량: 트랜잭션 수, API 호출 감사 로그 수, 에이전트 구성 수
    pub async fn get_user_usage(&self, id: Uuid) -> Result<UserUsage> {
        let (transactions,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM transactions WHERE user_id = $1")
                .bind(id)
                .fetch_one(self.pool())
                .await?;

        let (api_calls,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM audit_log WHERE user_id = $1 AND action = 'api_call'",
        )
        .bind(id)
        .fetch_one(self.pool())
        .await?;

        let (agent_executions,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM agent_configurations WHERE user_id = $1")
                .bind(id)
                .fetch_one(self.pool())
                .await?;

        Ok(UserUsage {
            transactions,
            api_calls,
            agent_executions,
        })
    }
}

/// 크레딧은 음수가 되지 않음
pub(crate) fn next_credits(current: i64, delta: i64) -> i64 {
    current.saturating_add(delta).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_without_filters() {
        let qb = list_users_query(&UserFilter::default(), PageRequest::new(Some(2)));
        assert_eq!(
            qb.sql(),
            "SELECT * FROM users WHERE TRUE ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_list_query_with_search_and_filters() {
        let filter = UserFilter {
            search: Some("alice".to_string()),
            status: Some("active".to_string()),
            role: Some("admin".to_string()),
            plan: None,
        };
        let qb = list_users_query(&filter, PageRequest::new(None));
        assert_eq!(
            qb.sql(),
            "SELECT * FROM users WHERE TRUE AND (email ILIKE $1 OR full_name ILIKE $2) \
             AND status = $3 AND role = $4 ORDER BY created_at DESC LIMIT $5 OFFSET $6"
        );

        let count = count_users_query(&filter);
        assert_eq!(
            count.sql(),
            "SELECT COUNT(*) FROM users WHERE TRUE AND (email ILIKE $1 OR full_name ILIKE $2) \
             AND status = $3 AND role = $4"
        );
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = UserFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(count_users_query(&filter).sql(), "SELECT COUNT(*) FROM users WHERE TRUE");
    }

    #[test]
    fn test_next_credits_never_negative() {
        assert_eq!(next_credits(100, 50), 150);
        assert_eq!(next_credits(100, -30), 70);
        assert_eq!(next_credits(10, -30), 0);
        assert_eq!(next_credits(i64::MAX, 1), i64::MAX);
    }

    #[test]
    fn test_user_update_is_empty() {
        assert!(UserUpdate::default().is_empty());
        let update: UserUpdate = serde_json::from_str(r#"{"plan":"pro"}"#).unwrap();
        assert!(!update.is_empty());
        assert!(serde_json::from_str::<UserUpdate>(r#"{"plan":"gold"}"#).is_err());
    }
}
