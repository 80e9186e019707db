//! 요금제 / 인보이스 / 결제 테이블

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{push_eq, BillingPlan, Database, Invoice};

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlan {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub price_monthly: f64,
    #[serde(default)]
    pub price_yearly: f64,
    #[serde(default)]
    pub credits_included: i64,
    #[serde(default = "empty_features")]
    pub features: Value,
    #[serde(default = "empty_object")]
    pub limits: Value,
}

fn empty_features() -> Value {
    Value::Array(Vec::new())
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanUpdate {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub price_monthly: Option<f64>,
    pub price_yearly: Option<f64>,
    pub credits_included: Option<i64>,
    pub features: Option<Value>,
    pub limits: Option<Value>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<String>,
}

pub(crate) fn list_invoices_query<'a>(filter: &'a InvoiceFilter) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM billing_invoices WHERE TRUE");
    push_eq(&mut qb, "user_id", filter.user_id);
    push_eq(&mut qb, "status", crate::types::filter_value(filter.status.as_deref()));
    qb.push(" ORDER BY created_at DESC");
    qb
}

impl Database {
    pub async fn list_plans(&self) -> Result<Vec<BillingPlan>> {
        let plans = sqlx::query_as::<_, BillingPlan>(
            "SELECT * FROM billing_plans ORDER BY price_monthly ASC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(plans)
    }

    pub async fn get_plan(&self, id: Uuid) -> Result<BillingPlan> {
        let plan = sqlx::query_as::<_, BillingPlan>("SELECT * FROM billing_plans WHERE id = $1")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(plan)
    }

    pub async fn create_plan(&self, input: &NewPlan) -> Result<BillingPlan> {
        let plan = sqlx::query_as::<_, BillingPlan>(
            r#"
            INSERT INTO billing_plans (
                name, display_name, description, price_monthly,
                price_yearly, credits_included, features, limits
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.display_name)
        .bind(&input.description)
        .bind(input.price_monthly)
        .bind(input.price_yearly)
        .bind(input.credits_included)
        .bind(&input.features)
        .bind(&input.limits)
        .fetch_one(self.pool())
        .await?;
        Ok(plan)
    }

    pub async fn update_plan(&self, id: Uuid, update: &PlanUpdate) -> Result<BillingPlan> {
        let plan = sqlx::query_as::<_, BillingPlan>(
            r#"
            UPDATE billing_plans SET
                display_name = COALESCE($2, display_name),
                description = COALESCE($3, description),
                price_monthly = COALESCE($4, price_monthly),
                price_yearly = COALESCE($5, price_yearly),
                credits_included = COALESCE($6, credits_included),
                features = COALESCE($7, features),
                limits = COALESCE($8, limits),
                active = COALESCE($9, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.display_name)
        .bind(&update.description)
        .bind(update.price_monthly)
        .bind(update.price_yearly)
        .bind(update.credits_included)
        .bind(&update.features)
        .bind(&update.limits)
        .bind(update.active)
        .fetch_one(self.pool())
        .await?;
        Ok(plan)
    }

    pub async fn delete_plan(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM billing_plans WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        let invoices = list_invoices_query(filter)
            .build_query_as::<Invoice>()
            .fetch_all(self.pool())
            .await?;
        Ok(invoices)
    }

    /// 사용자 결제 이력 (최신순)
    pub async fn get_user_billing_history(&self, user_id: Uuid) -> Result<Vec<Invoice>> {
        let filter = InvoiceFilter {
            user_id: Some(user_id),
            status: None,
        };
        self.list_invoices(&filter).await
    }

    /// 환불 처리
    ///
    /// # Flow
    ///
    /// 1. 인보이스 status → refunded
    /// 2. 해당 인보이스의 결제 row 전부 → refunded
    ///
    /// 두 UPDATE는 순차 실행이며 2단계 실패 시 1단계는 되돌리지 않음
    pub async fn refund_payment(&self, invoice_id: Uuid) -> Result<Invoice> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE billing_invoices SET status = 'refunded', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(invoice_id)
        .fetch_one(self.pool())
        .await?;

        let payments = sqlx::query("UPDATE billing_payments SET status = 'refunded' WHERE invoice_id = $1")
            .bind(invoice_id)
            .execute(self.pool())
            .await?;

        tracing::info!(
            invoice_id = %invoice_id,
            payments = payments.rows_affected(),
            "Invoice refunded"
        );
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_invoices_query() {
        let filter = InvoiceFilter::default();
        assert_eq!(
            list_invoices_query(&filter).sql(),
            "SELECT * FROM billing_invoices WHERE TRUE ORDER BY created_at DESC"
        );

        let filter = InvoiceFilter {
            user_id: Some(Uuid::new_v4()),
            status: Some("paid".to_string()),
        };
        assert_eq!(
            list_invoices_query(&filter).sql(),
            "SELECT * FROM billing_invoices WHERE TRUE AND user_id = $1 AND status = $2 \
             ORDER BY created_at DESC"
        );
    }

    #[test]
    fn test_status_all_is_not_filtered() {
        let filter = InvoiceFilter {
            user_id: None,
            status: Some("all".to_string()),
        };
        assert_eq!(
            list_invoices_query(&filter).sql(),
            "SELECT * FROM billing_invoices WHERE TRUE ORDER BY created_at DESC"
        );
    }

    #[test]
    fn test_new_plan_defaults() {
        let plan: NewPlan =
            serde_json::from_str(r#"{"name":"pro","display_name":"Pro"}"#).unwrap();
        assert_eq!(plan.price_monthly, 0.0);
        assert_eq!(plan.features, serde_json::json!([]));
        assert_eq!(plan.limits, serde_json::json!({}));
    }
}
