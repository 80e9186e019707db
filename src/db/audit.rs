//! 감사 로그 (`audit_log`)

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{push_eq, AuditLog, Database};
use crate::types::AuditStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct NewAuditEntry {
    pub user_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: Option<AuditStatus>,
}

impl NewAuditEntry {
    pub fn new(action: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            user_id: None,
            agent_id: None,
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            details: None,
            ip_address: None,
            user_agent: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    pub user_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

impl AuditFilter {
    pub const DEFAULT_LIMIT: i64 = 100;
}

pub(crate) fn audit_logs_query(filter: &AuditFilter) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM audit_log WHERE TRUE");
    push_eq(&mut qb, "user_id", filter.user_id);
    push_eq(&mut qb, "agent_id", filter.agent_id);
    push_eq(&mut qb, "action", filter.action.as_deref());
    push_eq(&mut qb, "resource_type", filter.resource_type.as_deref());
    push_eq(&mut qb, "status", filter.status.as_deref());
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(filter.limit.unwrap_or(AuditFilter::DEFAULT_LIMIT).max(1));
    qb
}

impl Database {
    /// status 기본값 success, details 기본값 {}
    pub async fn log_audit_event(&self, entry: &NewAuditEntry) -> Result<AuditLog> {
        let log = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_log (
                user_id, agent_id, action, resource_type, resource_id,
                details, ip_address, user_agent, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.agent_id)
        .bind(&entry.action)
        .bind(&entry.resource_type)
        .bind(&entry.resource_id)
        .bind(entry.details.clone().unwrap_or_else(|| json!({})))
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.status.unwrap_or(AuditStatus::Success).as_str())
        .fetch_one(self.pool())
        .await?;
        Ok(log)
    }

    /// 감사 로그 기록 실패는 요청을 실패시키지 않음 (경고 로그만)
    pub async fn record_audit(&self, entry: &NewAuditEntry) {
        if let Err(e) = self.log_audit_event(entry).await {
            tracing::warn!(action = %entry.action, error = %e, "Failed to write audit log");
        }
    }

    pub async fn get_audit_logs(&self, filter: &AuditFilter) -> Result<Vec<AuditLog>> {
        let logs = audit_logs_query(filter)
            .build_query_as::<AuditLog>()
            .fetch_all(self.pool())
            .await?;
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_query_default_limit() {
        let filter = AuditFilter::default();
        assert_eq!(
            audit_logs_query(&filter).sql(),
            "SELECT * FROM audit_log WHERE TRUE ORDER BY created_at DESC LIMIT $1"
        );
    }

    #[test]
    fn test_audit_query_filters() {
        let filter = AuditFilter {
            action: Some("update_user".to_string()),
            status: Some("failure".to_string()),
            limit: Some(10),
            ..Default::default()
        };
        assert_eq!(
            audit_logs_query(&filter).sql(),
            "SELECT * FROM audit_log WHERE TRUE AND action = $1 AND status = $2 \
             ORDER BY created_at DESC LIMIT $3"
        );
    }

    #[test]
    fn test_new_entry_defaults() {
        let entry = NewAuditEntry::new("update_settings", "settings");
        assert_eq!(entry.action, "update_settings");
        assert!(entry.status.is_none());
        assert!(entry.details.is_none());
    }
}
