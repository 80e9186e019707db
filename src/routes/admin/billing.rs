//! Admin: 요금제 / 인보이스 / 결제
//!
//! # Flow
//!
//! ```text
//! checkout:  plan 조회 → 결제 processor checkout session 생성 → {url}
//! crypto:    수신 지갑 + 금액 + 만료(30분) 안내 → 클라이언트가 직접 송금
//! verify:    트랜잭션 서명 → Solana RPC signature status 확인
//! ```

use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::{
    billing::{InvoiceFilter, NewPlan, PlanUpdate},
    BillingPlan, Invoice,
};
use crate::error::ApiError;
use crate::middleware::AdminContext;
use crate::routes::{deleted, required, ApiJson, ApiPath, ApiQuery, MessageResponse};
use crate::services::CryptoPaymentRequest;
use crate::types::{BillingCycle, PaymentCurrency};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    #[serde(default = "default_cycle")]
    pub billing_cycle: BillingCycle,
}

fn default_cycle() -> BillingCycle {
    BillingCycle::Monthly
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CryptoPaymentBody {
    pub user_id: Uuid,
    pub amount: f64,
    pub currency: PaymentCurrency,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentBody {
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub signature: String,
    pub verified: bool,
}

// ============ Plans ============

/// GET /api/admin/billing/plans
pub async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<BillingPlan>>, ApiError> {
    Ok(Json(state.db.list_plans().await?))
}

/// POST /api/admin/billing/plans
pub async fn create_plan(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiJson(input): ApiJson<NewPlan>,
) -> Result<Json<BillingPlan>, ApiError> {
    if required(Some(input.name.as_str())).is_none() {
        return Err(ApiError::BadRequest("Plan name is required".to_string()));
    }
    let plan = state.db.create_plan(&input).await?;
    super::audit(&state, &ctx, "create_plan", "billing_plan", plan.id, json!({ "name": plan.name })).await;
    Ok(Json(plan))
}

/// PUT /api/admin/billing/plans/:id
pub async fn update_plan(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<PlanUpdate>,
) -> Result<Json<BillingPlan>, ApiError> {
    let plan = state.db.update_plan(id, &update).await?;
    super::audit(&state, &ctx, "update_plan", "billing_plan", id, Value::Null).await;
    Ok(Json(plan))
}

/// DELETE /api/admin/billing/plans/:id
pub async fn delete_plan(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let response = deleted(state.db.delete_plan(id).await?, "Plan")?;
    super::audit(&state, &ctx, "delete_plan", "billing_plan", id, Value::Null).await;
    Ok(response)
}

// ============ Invoices ============

/// GET /api/admin/billing/invoices?user_id=&status=
pub async fn list_invoices(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<InvoiceFilter>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    Ok(Json(state.db.list_invoices(&filter).await?))
}

/// POST /api/admin/billing/invoices/:id/refund
///
/// 인보이스 → 결제 순서로 refunded 표시 (롤백 없음)
pub async fn refund_payment(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(invoice_id): ApiPath<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = state.db.refund_payment(invoice_id).await?;
    super::audit(&state, &ctx, "refund_payment", "invoice", invoice_id, json!({ "amount": invoice.amount })).await;
    tracing::info!(invoice_id = %invoice_id, "Invoice refunded");
    Ok(Json(invoice))
}

// ============ Payments ============

/// POST /api/admin/billing/checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    if !state.payments.checkout_enabled() {
        return Err(ApiError::ServiceUnavailable("Payment processor".to_string()));
    }

    let plan = state.db.get_plan(req.plan_id).await?;
    let url = state
        .payments
        .create_checkout(req.user_id, &plan, req.billing_cycle)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, plan_id = %req.plan_id, "Checkout session failed");
            ApiError::Upstream("Failed to create checkout session".to_string())
        })?;

    Ok(Json(CheckoutResponse { url }))
}

/// POST /api/admin/billing/crypto
pub async fn create_crypto_payment_request(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CryptoPaymentBody>,
) -> Result<Json<CryptoPaymentRequest>, ApiError> {
    if !(req.amount.is_finite() && req.amount > 0.0) {
        return Err(ApiError::ValidationError("amount must be greater than 0".to_string()));
    }
    if !state.payments.crypto_enabled() {
        return Err(ApiError::ServiceUnavailable("Crypto payments".to_string()));
    }

    let request = state
        .payments
        .crypto_payment_request(req.amount, req.currency, Utc::now())
        .map_err(|e| {
            tracing::error!(error = %e, "Crypto payment request failed");
            ApiError::ServiceUnavailable("Crypto payments".to_string())
        })?;

    tracing::info!(user_id = %req.user_id, amount = req.amount, currency = %req.currency, "Crypto payment requested");
    Ok(Json(request))
}

/// POST /api/admin/billing/crypto/verify
pub async fn verify_crypto_payment(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyPaymentBody>,
) -> Result<Json<VerifyPaymentResponse>, ApiError> {
    let signature = required(req.signature.as_deref())
        .ok_or_else(|| ApiError::BadRequest("signature is required".to_string()))?;

    let verified = state.solana.verify_signature(signature).await.map_err(|e| {
        tracing::error!(error = %e, "Signature lookup failed");
        ApiError::Upstream("Failed to verify payment".to_string())
    })?;

    Ok(Json(VerifyPaymentResponse {
        signature: signature.to_string(),
        verified,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_request_defaults_to_monthly() {
        let req: CheckoutRequest = serde_json::from_value(json!({
            "user_id": Uuid::nil(),
            "plan_id": Uuid::nil(),
        }))
        .unwrap();
        assert_eq!(req.billing_cycle, BillingCycle::Monthly);

        let req: CheckoutRequest = serde_json::from_value(json!({
            "user_id": Uuid::nil(),
            "plan_id": Uuid::nil(),
            "billing_cycle": "yearly",
        }))
        .unwrap();
        assert_eq!(req.billing_cycle, BillingCycle::Yearly);
    }

    #[test]
    fn test_crypto_body_rejects_unknown_currency() {
        let body = serde_json::from_value::<CryptoPaymentBody>(json!({
            "user_id": Uuid::nil(),
            "amount": 1.5,
            "currency": "BTC",
        }));
        assert!(body.is_err());
    }
}
