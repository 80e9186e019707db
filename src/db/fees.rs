//! 수수료 및 수수료 오버라이드

use anyhow::Result;
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{push_eq, Database, Fee, FeeOverride};
use crate::types::FeeType;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeeUpdate {
    pub amount: Option<f64>,
    pub percentage: Option<f64>,
    pub active: Option<bool>,
}

/// 오버라이드 대상 (에이전트 또는 사용자)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideTarget {
    Agent(Uuid),
    User(Uuid),
}

impl OverrideTarget {
    fn column(&self) -> &'static str {
        match self {
            OverrideTarget::Agent(_) => "agent_id",
            OverrideTarget::User(_) => "user_id",
        }
    }

    fn id(&self) -> Uuid {
        match self {
            OverrideTarget::Agent(id) | OverrideTarget::User(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FeeOverrideFilter {
    pub agent_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// 부분 unique index (agent_id, fee_type) / (user_id, fee_type) 에 맞춘 upsert 구문
pub(crate) fn upsert_override_sql(target: OverrideTarget) -> String {
    let column = target.column();
    format!(
        "INSERT INTO fee_overrides ({column}, fee_type, amount, percentage, active) \
         VALUES ($1, $2, $3, $4, TRUE) \
         ON CONFLICT ({column}, fee_type) WHERE {column} IS NOT NULL \
         DO UPDATE SET amount = EXCLUDED.amount, percentage = EXCLUDED.percentage, active = TRUE \
         RETURNING *"
    )
}

pub(crate) fn list_overrides_query<'a>(filter: FeeOverrideFilter) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM fee_overrides WHERE TRUE");
    push_eq(&mut qb, "agent_id", filter.agent_id);
    push_eq(&mut qb, "user_id", filter.user_id);
    qb.push(" ORDER BY created_at DESC");
    qb
}

impl Database {
    pub async fn list_fees(&self) -> Result<Vec<Fee>> {
        let fees = sqlx::query_as::<_, Fee>("SELECT * FROM fees ORDER BY fee_type")
            .fetch_all(self.pool())
            .await?;
        Ok(fees)
    }

    pub async fn update_fee(&self, fee_type: FeeType, update: &FeeUpdate) -> Result<Fee> {
        let fee = sqlx::query_as::<_, Fee>(
            r#"
            UPDATE fees SET
                amount = COALESCE($2, amount),
                percentage = COALESCE($3, percentage),
                active = COALESCE($4, active),
                updated_at = NOW()
            WHERE fee_type = $1
            RETURNING *
            "#,
        )
        .bind(fee_type.as_str())
        .bind(update.amount)
        .bind(update.percentage)
        .bind(update.active)
        .fetch_one(self.pool())
        .await?;
        Ok(fee)
    }

    pub async fn set_fee_override(
        &self,
        target: OverrideTarget,
        fee_type: FeeType,
        amount: f64,
        percentage: Option<f64>,
    ) -> Result<FeeOverride> {
        let sql = upsert_override_sql(target);
        let fee_override = sqlx::query_as::<_, FeeOverride>(&sql)
            .bind(target.id())
            .bind(fee_type.as_str())
            .bind(amount)
            .bind(percentage)
            .fetch_one(self.pool())
            .await?;
        Ok(fee_override)
    }

    pub async fn list_fee_overrides(&self, filter: FeeOverrideFilter) -> Result<Vec<FeeOverride>> {
        let overrides = list_overrides_query(filter)
            .build_query_as::<FeeOverride>()
            .fetch_all(self.pool())
            .await?;
        Ok(overrides)
    }

    pub async fn delete_fee_override(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM fee_overrides WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_targets_matching_partial_index() {
        let sql = upsert_override_sql(OverrideTarget::Agent(Uuid::nil()));
        assert!(sql.starts_with("INSERT INTO fee_overrides (agent_id, fee_type"));
        assert!(sql.contains("ON CONFLICT (agent_id, fee_type) WHERE agent_id IS NOT NULL"));

        let sql = upsert_override_sql(OverrideTarget::User(Uuid::nil()));
        assert!(sql.contains("ON CONFLICT (user_id, fee_type) WHERE user_id IS NOT NULL"));
        assert!(!sql.contains("agent_id"));
    }

    #[test]
    fn test_list_overrides_query() {
        let qb = list_overrides_query(FeeOverrideFilter {
            agent_id: None,
            user_id: Some(Uuid::nil()),
        });
        assert_eq!(
            qb.sql(),
            "SELECT * FROM fee_overrides WHERE TRUE AND user_id = $1 ORDER BY created_at DESC"
        );
    }
}
